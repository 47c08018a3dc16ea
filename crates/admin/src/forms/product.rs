//! Add/edit product form and the upload payload built from it.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use reqwest::multipart::{Form, Part};

use tyhub_core::ProductType;

use super::{FormErrors, UploadedFile};
use crate::api::{ApiError, Product};

const MIN_PRICE: f64 = 0.01;

/// Whether the form creates a product or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Raw product form submission.
///
/// Text fields keep exactly what was typed so the form can be re-rendered
/// with its validation messages.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub product_type: String,
    pub price: String,
    pub stock: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<UploadedFile>,
    pub file: Option<UploadedFile>,
}

impl ProductForm {
    /// Read a `multipart/form-data` submission.
    ///
    /// `sizes` and `colors` may be repeated or comma separated. Empty file
    /// inputs are ignored; only the first `file` is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "images" | "file" => {
                    let file_name = field.file_name().map(str::to_owned);
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await?;
                    let Some(upload) = UploadedFile::new(
                        file_name.as_deref(),
                        content_type.as_deref(),
                        bytes.to_vec(),
                    ) else {
                        continue;
                    };
                    if name == "images" {
                        form.images.push(upload);
                    } else if form.file.is_none() {
                        form.file = Some(upload);
                    }
                }
                _ => {
                    let value = field.text().await?;
                    form.set_text(&name, value);
                }
            }
        }

        Ok(form)
    }

    /// Prefill the edit form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone().unwrap_or_default(),
            product_type: product.product_type.as_str().to_string(),
            price: product.price.to_string(),
            stock: product.stock.map(|s| s.to_string()).unwrap_or_default(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            images: Vec::new(),
            file: None,
        }
    }

    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "type" => self.product_type = value,
            "price" => self.price = value,
            "stock" => self.stock = value,
            "sizes" => self.sizes.extend(split_list(&value)),
            "colors" => self.colors.extend(split_list(&value)),
            _ => tracing::debug!(field = %name, "Ignoring unknown product form field"),
        }
    }

    /// Sizes as shown in the text input.
    #[must_use]
    pub fn sizes_text(&self) -> String {
        self.sizes.join(", ")
    }

    /// Colors as shown in the text input.
    #[must_use]
    pub fn colors_text(&self) -> String {
        self.colors.join(", ")
    }

    /// Whether the product type currently selected is digital.
    #[must_use]
    pub fn is_digital(&self) -> bool {
        self.product_type == ProductType::Digital.as_str()
    }

    /// Validate the submission into an upload payload.
    ///
    /// # Errors
    ///
    /// Returns field errors for `title`, `type`, `price`, `stock` and `file`.
    pub fn validate(&self, mode: FormMode) -> Result<ProductPayload, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Product name is required");
        }

        let product_type = if self.product_type.trim().is_empty() {
            errors.add("type", "Product type is required");
            None
        } else {
            self.product_type
                .trim()
                .parse::<ProductType>()
                .map_err(|_| errors.add("type", "Product type is required"))
                .ok()
        };

        let price = parse_price(&self.price)
            .map_err(|message| errors.add("price", message))
            .ok();

        let kind = match product_type {
            Some(ProductType::Physical) => parse_stock(&self.stock)
                .map_err(|message| errors.add("stock", message))
                .ok()
                .map(|stock| ProductKind::Physical {
                    stock,
                    images: self.images.clone(),
                    sizes: self.sizes.clone(),
                    colors: self.colors.clone(),
                }),
            Some(ProductType::Digital) => {
                if mode == FormMode::Create && self.file.is_none() {
                    errors.add("file", "Product file is required");
                }
                Some(ProductKind::Digital {
                    file: self.file.clone(),
                })
            }
            None => None,
        };

        match (price, kind) {
            (Some(price), Some(kind)) if errors.is_empty() => Ok(ProductPayload {
                title: title.to_string(),
                description: self.description.trim().to_string(),
                price,
                kind,
            }),
            _ => Err(errors),
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_price(raw: &str) -> Result<f64, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Price is required");
    }
    let price: f64 = raw.parse().map_err(|_| "Price must be a number")?;
    if !price.is_finite() {
        return Err("Price must be a number");
    }
    if price < MIN_PRICE {
        return Err("Price must be greater than 0");
    }
    Ok(price)
}

/// Blank stock means zero.
fn parse_stock(raw: &str) -> Result<u32, &'static str> {
    const NEGATIVE: &str = "Stock cannot be negative";
    const WHOLE: &str = "Stock must be a whole number";

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    if let Ok(stock) = raw.parse::<i64>() {
        if stock < 0 {
            return Err(NEGATIVE);
        }
        return u32::try_from(stock).map_err(|_| "Stock is too large");
    }
    match raw.parse::<f64>() {
        Ok(stock) if stock < 0.0 => Err(NEGATIVE),
        _ => Err(WHOLE),
    }
}

/// Validated product ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub kind: ProductKind,
}

/// Type-specific part of a [`ProductPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKind {
    Physical {
        stock: u32,
        images: Vec<UploadedFile>,
        sizes: Vec<String>,
        colors: Vec<String>,
    },
    /// `file` is `None` only when editing and keeping the existing file.
    Digital { file: Option<UploadedFile> },
}

impl ProductKind {
    #[must_use]
    pub const fn product_type(&self) -> ProductType {
        match self {
            Self::Physical { .. } => ProductType::Physical,
            Self::Digital { .. } => ProductType::Digital,
        }
    }
}

/// One part of the multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPart {
    Text(&'static str, String),
    File(&'static str, UploadedFile),
}

impl PayloadPart {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(name, _) | Self::File(name, _) => name,
        }
    }
}

impl ProductPayload {
    /// Upload parts in wire order: `title`, `description`, `type`, `price`,
    /// then the type-specific parts.
    #[must_use]
    pub fn into_parts(self) -> Vec<PayloadPart> {
        let mut parts = vec![
            PayloadPart::Text("title", self.title),
            PayloadPart::Text("description", self.description),
            PayloadPart::Text("type", self.kind.product_type().as_str().to_string()),
            PayloadPart::Text("price", self.price.to_string()),
        ];

        match self.kind {
            ProductKind::Physical {
                stock,
                images,
                sizes,
                colors,
            } => {
                parts.push(PayloadPart::Text("stock", stock.to_string()));
                parts.extend(sizes.into_iter().map(|s| PayloadPart::Text("sizes", s)));
                parts.extend(colors.into_iter().map(|c| PayloadPart::Text("colors", c)));
                parts.extend(images.into_iter().map(|i| PayloadPart::File("images", i)));
            }
            ProductKind::Digital { file } => {
                parts.extend(file.map(|f| PayloadPart::File("file", f)));
            }
        }

        parts
    }

    /// Build the `multipart/form-data` body.
    ///
    /// # Errors
    ///
    /// Returns an error if an upload carries an invalid content type.
    pub fn into_multipart(self) -> Result<Form, ApiError> {
        self.into_parts()
            .into_iter()
            .try_fold(Form::new(), |form, part| match part {
                PayloadPart::Text(name, value) => Ok(form.text(name, value)),
                PayloadPart::File(name, file) => {
                    let part = Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)?;
                    Ok(form.part(name, part))
                }
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(Some(name), Some("image/png"), vec![0x89, 0x50]).unwrap()
    }

    fn physical_form() -> ProductForm {
        ProductForm {
            title: "Canvas Tote".to_string(),
            description: "Sturdy bag".to_string(),
            product_type: "physical".to_string(),
            price: "19.99".to_string(),
            stock: "12".to_string(),
            sizes: vec!["M".to_string()],
            ..ProductForm::default()
        }
    }

    fn digital_form() -> ProductForm {
        ProductForm {
            title: "Pattern Pack".to_string(),
            product_type: "digital".to_string(),
            price: "5".to_string(),
            file: Some(upload("pack.zip")),
            ..ProductForm::default()
        }
    }

    fn names(parts: &[PayloadPart]) -> Vec<&'static str> {
        parts.iter().map(PayloadPart::name).collect()
    }

    #[test]
    fn test_physical_without_images_is_accepted() {
        let payload = physical_form().validate(FormMode::Create).unwrap();
        let parts = payload.into_parts();

        assert_eq!(
            names(&parts),
            ["title", "description", "type", "price", "stock", "sizes"]
        );
        assert!(parts.contains(&PayloadPart::Text("stock", "12".to_string())));
    }

    #[test]
    fn test_physical_never_sends_file() {
        let mut form = physical_form();
        form.images = vec![upload("a.png"), upload("b.png")];
        form.file = Some(upload("stray.pdf"));

        let parts = form.validate(FormMode::Create).unwrap().into_parts();
        let names = names(&parts);

        assert_eq!(names.iter().filter(|n| **n == "images").count(), 2);
        assert!(!names.contains(&"file"));
    }

    #[test]
    fn test_digital_sends_exactly_one_file_and_no_images() {
        let mut form = digital_form();
        form.images = vec![upload("a.png")];
        form.stock = "10".to_string();

        let parts = form.validate(FormMode::Create).unwrap().into_parts();
        let names = names(&parts);

        assert_eq!(names, ["title", "description", "type", "price", "file"]);
    }

    #[test]
    fn test_digital_create_requires_file_but_edit_does_not() {
        let mut form = digital_form();
        form.file = None;

        let errors = form.validate(FormMode::Create).unwrap_err();
        assert_eq!(errors.get("file"), Some("Product file is required"));

        let parts = form.validate(FormMode::Edit).unwrap().into_parts();
        assert!(!names(&parts).contains(&"file"));
    }

    #[test]
    fn test_required_fields() {
        let errors = ProductForm::default()
            .validate(FormMode::Create)
            .unwrap_err();

        assert_eq!(errors.get("title"), Some("Product name is required"));
        assert_eq!(errors.get("type"), Some("Product type is required"));
        assert_eq!(errors.get("price"), Some("Price is required"));
    }

    #[test]
    fn test_price_must_be_positive() {
        let mut form = physical_form();
        form.price = "0".to_string();
        assert_eq!(
            form.validate(FormMode::Create).unwrap_err().get("price"),
            Some("Price must be greater than 0")
        );

        form.price = "0.01".to_string();
        assert!(form.validate(FormMode::Create).is_ok());

        form.price = "abc".to_string();
        assert_eq!(
            form.validate(FormMode::Create).unwrap_err().get("price"),
            Some("Price must be a number")
        );
    }

    #[test]
    fn test_stock_rules() {
        assert_eq!(parse_stock(""), Ok(0));
        assert_eq!(parse_stock(" 7 "), Ok(7));
        assert_eq!(parse_stock("-1"), Err("Stock cannot be negative"));
        assert_eq!(parse_stock("-1.5"), Err("Stock cannot be negative"));
        assert_eq!(parse_stock("2.5"), Err("Stock must be a whole number"));
        assert_eq!(parse_stock("many"), Err("Stock must be a whole number"));
    }

    #[test]
    fn test_stock_is_ignored_for_digital() {
        let mut form = digital_form();
        form.stock = "-3".to_string();
        assert!(form.validate(FormMode::Create).is_ok());
    }

    #[test]
    fn test_list_fields_accept_commas() {
        let mut form = ProductForm::default();
        form.set_text("sizes", "S, M,,L ".to_string());
        form.set_text("sizes", "XL".to_string());
        assert_eq!(form.sizes, ["S", "M", "L", "XL"]);
        assert_eq!(form.sizes_text(), "S, M, L, XL");
    }

    #[test]
    fn test_multipart_builds() {
        let payload = digital_form().validate(FormMode::Create).unwrap();
        assert!(payload.into_multipart().is_ok());
    }
}
