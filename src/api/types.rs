use serde::{Deserialize, Serialize};

use crate::models::{Listing, OperationKind};

/// Active search constraints, one optional field per dimension
///
/// `None` means "no constraint on that dimension" and the dimension is
/// omitted from the request entirely. This keeps an unset pets filter
/// distinguishable from an explicit `aceptaMascotas=false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub operation: Option<OperationKind>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<u32>,
    pub rooms: Option<u32>,
    pub accepts_pets: Option<bool>,
    pub location: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Query parameters for the dimensions that are actually set,
    /// using the backend's parameter names
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(op) = self.operation {
            pairs.push(("tipoOperacion".to_string(), op.as_param().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrecioARS".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrecioARS".to_string(), max.to_string()));
        }
        if let Some(bedrooms) = self.bedrooms {
            pairs.push(("habitaciones".to_string(), bedrooms.to_string()));
        }
        if let Some(rooms) = self.rooms {
            pairs.push(("ambientes".to_string(), rooms.to_string()));
        }
        if let Some(pets) = self.accepts_pets {
            pairs.push(("aceptaMascotas".to_string(), pets.to_string()));
        }
        if let Some(location) = &self.location {
            pairs.push(("ubicacion".to_string(), location.clone()));
        }
        pairs
    }
}

/// One page worth of listings to ask the backend for
///
/// Built fresh on every filter change or page navigation, never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub criteria: FilterCriteria,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32, criteria: FilterCriteria) -> Self {
        debug_assert!(page >= 1 && limit >= 1);
        Self {
            page,
            limit,
            criteria,
        }
    }

    /// Full query string content: pagination first, then set filters
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        pairs.extend(self.criteria.query_pairs());
        pairs
    }
}

/// One page of results as returned by `GET /properties`
#[derive(Debug, Clone, Deserialize)]
pub struct PageResult {
    #[serde(rename = "data")]
    pub items: Vec<Listing>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl PageResult {
    /// ceil(total / limit); 0 when there are no results
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit)) as u32
    }
}
