//! Goods introduction document and its products.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validate::{parse_date, validate_inn, validate_tnved_code};
use crate::error::ValidationError;

/// Document type used when none is set explicitly.
pub const DEFAULT_DOC_TYPE: &str = "LP_INTRODUCE_GOODS";

/// How the goods were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionType {
    OwnProduction,
    ContractProduction,
}

impl ProductionType {
    /// Wire name of this production type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionType::OwnProduction => "OWN_PRODUCTION",
            ProductionType::ContractProduction => "CONTRACT_PRODUCTION",
        }
    }
}

impl FromStr for ProductionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWN_PRODUCTION" => Ok(ProductionType::OwnProduction),
            "CONTRACT_PRODUCTION" => Ok(ProductionType::ContractProduction),
            other => Err(ValidationError::InvalidProductionType(other.to_string())),
        }
    }
}

impl fmt::Display for ProductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated goods introduction document.
///
/// Only obtainable through [`DocumentBuilder::build`] or by deserializing,
/// which runs the same checks, so every `Document` in hand is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DocumentBuilder")]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    participant_inn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_status: Option<String>,
    doc_type: String,
    import_request: bool,
    owner_inn: String,
    producer_inn: String,
    production_date: NaiveDate,
    production_type: ProductionType,
    products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reg_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reg_number: Option<String>,
}

impl Document {
    /// Start building a document.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn participant_inn(&self) -> &str {
        &self.participant_inn
    }

    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    pub fn doc_status(&self) -> Option<&str> {
        self.doc_status.as_deref()
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn is_import_request(&self) -> bool {
        self.import_request
    }

    pub fn owner_inn(&self) -> &str {
        &self.owner_inn
    }

    pub fn producer_inn(&self) -> &str {
        &self.producer_inn
    }

    pub fn production_date(&self) -> NaiveDate {
        self.production_date
    }

    pub fn production_type(&self) -> ProductionType {
        self.production_type
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn reg_date(&self) -> Option<NaiveDate> {
        self.reg_date
    }

    pub fn reg_number(&self) -> Option<&str> {
        self.reg_number.as_deref()
    }
}

/// A single product line of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_document_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_document_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    producer_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    production_date: Option<NaiveDate>,
    tnved_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uit_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uitu_code: Option<String>,
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ProductBuilder::deserialize(deserializer)?
            .build_at(0)
            .map_err(serde::de::Error::custom)
    }
}

impl Product {
    /// Start building a product.
    pub fn builder() -> ProductBuilder {
        ProductBuilder::default()
    }

    pub fn certificate_document(&self) -> Option<&str> {
        self.certificate_document.as_deref()
    }

    pub fn certificate_document_date(&self) -> Option<NaiveDate> {
        self.certificate_document_date
    }

    pub fn certificate_document_number(&self) -> Option<&str> {
        self.certificate_document_number.as_deref()
    }

    pub fn owner_inn(&self) -> Option<&str> {
        self.owner_inn.as_deref()
    }

    pub fn producer_inn(&self) -> Option<&str> {
        self.producer_inn.as_deref()
    }

    pub fn production_date(&self) -> Option<NaiveDate> {
        self.production_date
    }

    pub fn tnved_code(&self) -> &str {
        &self.tnved_code
    }

    pub fn uit_code(&self) -> Option<&str> {
        self.uit_code.as_deref()
    }

    pub fn uitu_code(&self) -> Option<&str> {
        self.uitu_code.as_deref()
    }
}

/// Unchecked document fields.
///
/// Doubles as the raw JSON form: deserializing a [`Document`] fills a
/// builder first and then calls [`DocumentBuilder::build`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentBuilder {
    description: Option<String>,
    participant_inn: Option<String>,
    doc_id: Option<String>,
    doc_status: Option<String>,
    doc_type: Option<String>,
    import_request: bool,
    owner_inn: Option<String>,
    producer_inn: Option<String>,
    production_date: Option<String>,
    production_type: Option<String>,
    products: Vec<ProductBuilder>,
    reg_date: Option<String>,
    reg_number: Option<String>,
}

impl DocumentBuilder {
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn participant_inn(mut self, value: impl Into<String>) -> Self {
        self.participant_inn = Some(value.into());
        self
    }

    pub fn doc_id(mut self, value: impl Into<String>) -> Self {
        self.doc_id = Some(value.into());
        self
    }

    pub fn doc_status(mut self, value: impl Into<String>) -> Self {
        self.doc_status = Some(value.into());
        self
    }

    pub fn doc_type(mut self, value: impl Into<String>) -> Self {
        self.doc_type = Some(value.into());
        self
    }

    pub fn import_request(mut self, value: bool) -> Self {
        self.import_request = value;
        self
    }

    pub fn owner_inn(mut self, value: impl Into<String>) -> Self {
        self.owner_inn = Some(value.into());
        self
    }

    pub fn producer_inn(mut self, value: impl Into<String>) -> Self {
        self.producer_inn = Some(value.into());
        self
    }

    /// Production date as `YYYY-MM-DD`.
    pub fn production_date(mut self, value: impl Into<String>) -> Self {
        self.production_date = Some(value.into());
        self
    }

    /// `OWN_PRODUCTION` or `CONTRACT_PRODUCTION`.
    pub fn production_type(mut self, value: impl Into<String>) -> Self {
        self.production_type = Some(value.into());
        self
    }

    pub fn product(mut self, product: ProductBuilder) -> Self {
        self.products.push(product);
        self
    }

    /// Registration date as `YYYY-MM-DD`.
    pub fn reg_date(mut self, value: impl Into<String>) -> Self {
        self.reg_date = Some(value.into());
        self
    }

    pub fn reg_number(mut self, value: impl Into<String>) -> Self {
        self.reg_number = Some(value.into());
        self
    }

    /// Validate every field and produce the document.
    ///
    /// Fails on the first invalid field.
    pub fn build(self) -> Result<Document, ValidationError> {
        let participant_inn = required("participant_inn", self.participant_inn)?;
        validate_inn("participant_inn", &participant_inn)?;

        let owner_inn = required("owner_inn", self.owner_inn)?;
        validate_inn("owner_inn", &owner_inn)?;

        let producer_inn = required("producer_inn", self.producer_inn)?;
        validate_inn("producer_inn", &producer_inn)?;

        let production_date = required("production_date", self.production_date)?;
        let production_date = parse_date("production_date", &production_date)?;

        let production_type: ProductionType =
            required("production_type", self.production_type)?.parse()?;

        let reg_date = self
            .reg_date
            .as_deref()
            .map(|value| parse_date("reg_date", value))
            .transpose()?;

        let products = self
            .products
            .into_iter()
            .enumerate()
            .map(|(index, product)| product.build_at(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Document {
            description: self.description,
            participant_inn,
            doc_id: self.doc_id,
            doc_status: self.doc_status,
            doc_type: self
                .doc_type
                .unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
            import_request: self.import_request,
            owner_inn,
            producer_inn,
            production_date,
            production_type,
            products,
            reg_date,
            reg_number: self.reg_number,
        })
    }
}

impl TryFrom<DocumentBuilder> for Document {
    type Error = ValidationError;

    fn try_from(builder: DocumentBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

/// Unchecked product fields, validated when the owning document is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductBuilder {
    certificate_document: Option<String>,
    certificate_document_date: Option<String>,
    certificate_document_number: Option<String>,
    owner_inn: Option<String>,
    producer_inn: Option<String>,
    production_date: Option<String>,
    tnved_code: Option<String>,
    uit_code: Option<String>,
    uitu_code: Option<String>,
}

impl ProductBuilder {
    pub fn certificate_document(mut self, value: impl Into<String>) -> Self {
        self.certificate_document = Some(value.into());
        self
    }

    /// Certificate date as `YYYY-MM-DD`.
    pub fn certificate_document_date(mut self, value: impl Into<String>) -> Self {
        self.certificate_document_date = Some(value.into());
        self
    }

    pub fn certificate_document_number(mut self, value: impl Into<String>) -> Self {
        self.certificate_document_number = Some(value.into());
        self
    }

    pub fn owner_inn(mut self, value: impl Into<String>) -> Self {
        self.owner_inn = Some(value.into());
        self
    }

    pub fn producer_inn(mut self, value: impl Into<String>) -> Self {
        self.producer_inn = Some(value.into());
        self
    }

    /// Production date as `YYYY-MM-DD`.
    pub fn production_date(mut self, value: impl Into<String>) -> Self {
        self.production_date = Some(value.into());
        self
    }

    pub fn tnved_code(mut self, value: impl Into<String>) -> Self {
        self.tnved_code = Some(value.into());
        self
    }

    pub fn uit_code(mut self, value: impl Into<String>) -> Self {
        self.uit_code = Some(value.into());
        self
    }

    pub fn uitu_code(mut self, value: impl Into<String>) -> Self {
        self.uitu_code = Some(value.into());
        self
    }

    fn build_at(self, index: usize) -> Result<Product, ValidationError> {
        if let Some(inn) = &self.owner_inn {
            validate_inn("products.owner_inn", inn)?;
        }
        if let Some(inn) = &self.producer_inn {
            validate_inn("products.producer_inn", inn)?;
        }

        let tnved_code = required("products.tnved_code", self.tnved_code)?;
        validate_tnved_code(&tnved_code)?;

        let uit_code = self.uit_code.filter(|code| !code.trim().is_empty());
        let uitu_code = self.uitu_code.filter(|code| !code.trim().is_empty());
        if uit_code.is_none() && uitu_code.is_none() {
            return Err(ValidationError::MissingProductCode { index });
        }

        let production_date = self
            .production_date
            .as_deref()
            .map(|value| parse_date("products.production_date", value))
            .transpose()?;
        let certificate_document_date = self
            .certificate_document_date
            .as_deref()
            .map(|value| parse_date("products.certificate_document_date", value))
            .transpose()?;

        Ok(Product {
            certificate_document: self.certificate_document,
            certificate_document_date,
            certificate_document_number: self.certificate_document_number,
            owner_inn: self.owner_inn,
            producer_inn: self.producer_inn,
            production_date,
            tnved_code,
            uit_code,
            uitu_code,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG_INN: &str = "7707083893";
    const PERSON_INN: &str = "500100732259";

    fn product() -> ProductBuilder {
        Product::builder()
            .tnved_code("6401100000")
            .uit_code("010460043993125621JgXJ5.T")
    }

    fn document() -> DocumentBuilder {
        Document::builder()
            .participant_inn(ORG_INN)
            .owner_inn(ORG_INN)
            .producer_inn(PERSON_INN)
            .production_date("2024-01-15")
            .production_type("OWN_PRODUCTION")
            .product(product())
    }

    #[test]
    fn test_build_valid_document() {
        let doc = document().doc_id("abc").reg_date("2024-01-16").build().unwrap();

        assert_eq!(doc.participant_inn(), ORG_INN);
        assert_eq!(doc.doc_type(), DEFAULT_DOC_TYPE);
        assert_eq!(doc.production_type(), ProductionType::OwnProduction);
        assert_eq!(doc.production_date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(doc.reg_date(), NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(doc.products().len(), 1);
        assert_eq!(doc.products()[0].tnved_code(), "6401100000");
        assert!(!doc.is_import_request());
    }

    #[test]
    fn test_invalid_production_type() {
        let err = document().production_type("STOLEN").build().unwrap_err();
        assert_eq!(err, ValidationError::InvalidProductionType("STOLEN".to_string()));
    }

    #[test]
    fn test_invalid_participant_inn() {
        let err = document().participant_inn("1234567890").build().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidInn { field: "participant_inn", .. }
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let err = Document::builder()
            .owner_inn(ORG_INN)
            .producer_inn(ORG_INN)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("participant_inn"));

        let err = document().production_date("  ").build().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("production_date"));
    }

    #[test]
    fn test_invalid_date() {
        let err = document().reg_date("2024-13-01").build().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { field: "reg_date", .. }));
    }

    #[test]
    fn test_product_requires_code() {
        let err = document()
            .product(Product::builder().tnved_code("6401"))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingProductCode { index: 1 });
    }

    #[test]
    fn test_product_validates_tnved_and_inn() {
        let err = document()
            .product(product().tnved_code("shoes"))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidTnvedCode("shoes".to_string()));

        let err = document()
            .product(product().owner_inn("0000000001"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidInn { field: "products.owner_inn", .. }
        ));
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let doc = document()
            .description("shoes")
            .import_request(true)
            .build()
            .unwrap();
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["participant_inn"], ORG_INN);
        assert_eq!(json["production_type"], "OWN_PRODUCTION");
        assert_eq!(json["production_date"], "2024-01-15");
        assert_eq!(json["doc_type"], DEFAULT_DOC_TYPE);
        assert_eq!(json["import_request"], true);
        assert_eq!(json["products"][0]["tnved_code"], "6401100000");
        assert!(json.get("reg_number").is_none());
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let json = r#"{
            "participant_inn": "7707083893",
            "owner_inn": "7707083893",
            "producer_inn": "7707083893",
            "production_date": "2024-01-15",
            "production_type": "CONTRACT_PRODUCTION",
            "products": [{"tnved_code": "6401", "uitu_code": "123"}]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.production_type(), ProductionType::ContractProduction);
        assert_eq!(doc.products()[0].uitu_code(), Some("123"));

        let bad = json.replace("CONTRACT_PRODUCTION", "IMPORTED");
        let err = serde_json::from_str::<Document>(&bad).unwrap_err();
        assert!(err.to_string().contains("Invalid production type"));
    }

    #[test]
    fn test_production_type_round_trip_names() {
        for ty in [ProductionType::OwnProduction, ProductionType::ContractProduction] {
            assert_eq!(ty.as_str().parse::<ProductionType>().unwrap(), ty);
            assert_eq!(ty.to_string(), ty.as_str());
        }
    }
}
