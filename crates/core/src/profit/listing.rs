use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// An item for sale at a retailer, as found by a listing collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailListing {
    pub title: String,
    #[serde(default)]
    pub catalog_code: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub current_price: Decimal,
    #[serde(default)]
    pub url: Option<String>,
}

impl RetailListing {
    pub fn new(title: impl Into<String>, current_price: Decimal) -> Self {
        Self {
            title: title.into(),
            catalog_code: None,
            brand: None,
            current_price,
            url: None,
        }
    }

    pub fn with_catalog_code(mut self, code: impl Into<String>) -> Self {
        self.catalog_code = Some(code.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Catalog code, if one with content was supplied.
    pub fn code(&self) -> Option<&str> {
        self.catalog_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Search text for a name lookup: brand and title when the title does
    /// not already start with the brand.
    pub fn search_name(&self) -> Option<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }

        match self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(brand) if !title.to_lowercase().starts_with(&brand.to_lowercase()) => {
                Some(format!("{} {}", brand, title))
            }
            _ => Some(title.to_string()),
        }
    }

    /// A listing must be identifiable by code or title.
    pub fn validate(&self) -> Result<()> {
        if self.code().is_none() && self.title.trim().is_empty() {
            return Err(Error::InvalidListing(
                "listing has neither a catalog code nor a title".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_search_name_prefixes_brand() {
        let listing = RetailListing::new("Dunk Low Panda", dec!(110)).with_brand("Nike");
        assert_eq!(listing.search_name().as_deref(), Some("Nike Dunk Low Panda"));

        let already = RetailListing::new("Nike Dunk Low", dec!(110)).with_brand("nike");
        assert_eq!(already.search_name().as_deref(), Some("Nike Dunk Low"));
    }

    #[test]
    fn test_blank_code_is_absent() {
        let listing = RetailListing::new("Dunk", dec!(110)).with_catalog_code("  ");
        assert_eq!(listing.code(), None);
    }

    #[test]
    fn test_validate_requires_identity() {
        assert!(RetailListing::new("Dunk", dec!(110)).validate().is_ok());
        assert!(RetailListing::new("", dec!(110))
            .with_catalog_code("DD1391-100")
            .validate()
            .is_ok());
        assert!(matches!(
            RetailListing::new(" ", dec!(110)).validate(),
            Err(Error::InvalidListing(_))
        ));
    }

    #[test]
    fn test_deserializes_camel_case() {
        let listing: RetailListing = serde_json::from_str(
            r#"{ "title": "Dunk Low", "catalogCode": "DD1391-100", "currentPrice": 110.0 }"#,
        )
        .unwrap();

        assert_eq!(listing.code(), Some("DD1391-100"));
        assert_eq!(listing.current_price, dec!(110));
    }
}
