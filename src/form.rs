use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::OperationKind;

/// Upper bound on attached images per listing, matching the backend's limit
pub const MAX_IMAGES: usize = 10;
/// Largest accepted image file in bytes
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// An image attached to a draft, sized at attach time so validation
/// needs no further filesystem access
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub size: u64,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// A listing being composed for submission
///
/// Numeric price fields stay as the raw typed strings until submission,
/// the same way the form collects them.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: String,
    pub requirements: Option<String>,
    pub operation: OperationKind,
    pub accepts_pets: bool,
    pub price_ars: String,
    pub price_usd: String,
    pub monthly_fee: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub rooms: u32,
    pub images: Vec<ImageFile>,
}

/// Submission blocked client-side, before any network call
#[derive(Debug, Clone, PartialEq)]
pub enum DraftError {
    TooManyImages(usize),
    UnsupportedImageType(PathBuf),
    ImageTooLarge(PathBuf, u64),
    MissingField(&'static str),
    InvalidNumber(&'static str),
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::TooManyImages(count) => {
                write!(f, "Máximo {MAX_IMAGES} imágenes permitidas (hay {count})")
            }
            DraftError::UnsupportedImageType(path) => {
                write!(f, "Formato de imagen no soportado: {}", path.display())
            }
            DraftError::ImageTooLarge(path, size) => {
                write!(
                    f,
                    "Imagen demasiado grande ({} bytes): {}",
                    size,
                    path.display()
                )
            }
            DraftError::MissingField(field) => write!(f, "Campo obligatorio vacío: {field}"),
            DraftError::InvalidNumber(field) => write!(f, "Valor numérico inválido: {field}"),
        }
    }
}

impl std::error::Error for DraftError {}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl ListingDraft {
    /// Check everything the client is responsible for before submission
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingField("titulo"));
        }
        if self.address.trim().is_empty() {
            return Err(DraftError::MissingField("direccion"));
        }
        if self.location.trim().is_empty() {
            return Err(DraftError::MissingField("ubicacion"));
        }
        if self.images.len() > MAX_IMAGES {
            return Err(DraftError::TooManyImages(self.images.len()));
        }
        for image in &self.images {
            if !has_allowed_extension(&image.path) {
                return Err(DraftError::UnsupportedImageType(image.path.clone()));
            }
            if image.size > MAX_IMAGE_BYTES {
                return Err(DraftError::ImageTooLarge(image.path.clone(), image.size));
            }
        }
        self.resolved_prices().map(|_| ())
    }

    /// Convert the typed price strings to numbers for submission
    ///
    /// The USD price may be left empty and defaults to 0; the ARS price
    /// and monthly fee are required.
    pub fn resolved_prices(&self) -> Result<(i64, i64, i64), DraftError> {
        let ars = self
            .price_ars
            .trim()
            .parse::<i64>()
            .map_err(|_| DraftError::InvalidNumber("precioARS"))?;
        let usd = if self.price_usd.trim().is_empty() {
            0
        } else {
            self.price_usd
                .trim()
                .parse::<i64>()
                .map_err(|_| DraftError::InvalidNumber("precioUSD"))?
        };
        let fee = self
            .monthly_fee
            .trim()
            .parse::<i64>()
            .map_err(|_| DraftError::InvalidNumber("expensas"))?;
        Ok((ars, usd, fee))
    }
}
