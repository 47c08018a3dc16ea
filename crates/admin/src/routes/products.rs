//! Product route handlers.
//!
//! The catalog table doubles as the home page. Add and edit forms post
//! `multipart/form-data` so images and digital files upload with the form.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use tyhub_core::{ProductId, ProductType, StockLevel};

use crate::api::Product;
use crate::components::{DataTableView, TableQuery, apply_table, data_table, truncate_words};
use crate::error::AppError;
use crate::filters::{self, format_money};
use crate::forms::{FormErrors, FormMode, ProductForm};
use crate::middleware::{RequireAuth, set_flash, take_flash};
use crate::models::{Flash, SessionContext};
use crate::services::ProductService;
use crate::state::AppState;

use super::{
    AdminUserView, SelectOption, detail_error, failure_status, load_error, mutation_error, render,
};

/// Words of description shown in the table.
const DESCRIPTION_WORDS: usize = 10;

/// Product row for the catalog table.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub type_label: &'static str,
    pub price: String,
    pub stock: String,
    pub stock_class: &'static str,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        let level = StockLevel::of(product.stock);
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            description: truncate_words(
                product.description.as_deref().unwrap_or_default(),
                DESCRIPTION_WORDS,
            ),
            type_label: product.product_type.label(),
            price: format_money(product.price),
            stock: level.display(),
            stock_class: level.css_class(),
            image_url: product.images.first().map(|image| image.url.clone()),
        }
    }
}

/// Catalog page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableView,
    pub products: Vec<ProductRowView>,
    pub total: usize,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

/// Add/edit product page template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub is_edit: bool,
    pub form: ProductForm,
    pub type_options: Vec<SelectOption>,
    pub existing_images: Vec<String>,
    pub existing_file: Option<String>,
    pub errors: FormErrors,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn new(session: &SessionContext, form: ProductForm, existing: Option<&Product>) -> Self {
        let type_options = ProductType::ALL
            .iter()
            .map(|t| SelectOption {
                value: t.as_str(),
                label: t.label(),
                selected: form.product_type == t.as_str(),
            })
            .collect();

        let (heading, action, submit_label) = match existing {
            Some(product) => (
                "Edit Product",
                format!("/products/{}", product.id),
                "Save Changes",
            ),
            None => ("Add New Product", "/products".to_string(), "Add Product"),
        };

        Self {
            admin_user: AdminUserView::from(session),
            current_path: "/products".to_string(),
            heading,
            action,
            submit_label,
            is_edit: existing.is_some(),
            form,
            type_options,
            existing_images: existing
                .map(|p| p.images.iter().map(|i| i.url.clone()).collect())
                .unwrap_or_default(),
            existing_file: existing.and_then(|p| p.file.as_ref().map(|f| f.url.clone())),
            errors: FormErrors::new(),
            error: None,
        }
    }
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_product))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit))
        .route("/products/{id}/delete", post(delete))
}

/// Catalog page.
///
/// GET / and GET /products
#[instrument(skip(auth, state, session))]
async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<Response, AppError> {
    let (products, total, error) = match ProductService::new(&state, &auth).list().await {
        Ok(products) => {
            let rows = apply_table(&products, &query)
                .into_iter()
                .map(ProductRowView::from)
                .collect();
            (rows, products.len(), None)
        }
        Err(err) => (Vec::new(), 0, Some(load_error(err, "products")?)),
    };

    let template = ProductsIndexTemplate {
        admin_user: AdminUserView::from(&auth),
        current_path: "/products".to_string(),
        table: data_table::products_table_config().view(&query),
        products,
        total,
        error,
        flash: take_flash(&session).await,
    };
    Ok(render(&template).into_response())
}

/// Add product form.
///
/// GET /products/new
async fn new_product(RequireAuth(auth): RequireAuth) -> Response {
    let form = ProductForm {
        product_type: ProductType::Physical.as_str().to_string(),
        ..ProductForm::default()
    };
    render(&ProductFormTemplate::new(&auth, form, None)).into_response()
}

/// Create a product.
///
/// POST /products
#[instrument(skip_all)]
async fn create(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let payload = match form.validate(FormMode::Create) {
        Ok(payload) => payload,
        Err(errors) => {
            let mut page = ProductFormTemplate::new(&auth, form, None);
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response());
        }
    };

    match ProductService::new(&state, &auth).create(payload).await {
        Ok(product) => {
            set_flash(&session, Flash::success(format!("Product \"{}\" created", product.title)))
                .await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(err) => {
            let status = failure_status(&err);
            let mut page = ProductFormTemplate::new(&auth, form, None);
            page.error = Some(mutation_error(err, "Failed to create product")?);
            Ok((status, render(&page)).into_response())
        }
    }
}

/// Edit product form, prefilled from the catalog.
///
/// GET /products/{id}/edit
#[instrument(skip(auth, state), fields(product_id = %id))]
async fn edit(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    match ProductService::new(&state, &auth).find(&id).await {
        Ok(product) => {
            let form = ProductForm::from_product(&product);
            let page = ProductFormTemplate::new(&auth, form, Some(&product));
            Ok(render(&page).into_response())
        }
        Err(err) => detail_error(
            err,
            "product",
            AdminUserView::from(&auth),
            ("/products", "Back to products"),
        ),
    }
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip(auth, state, session, multipart), fields(product_id = %id))]
async fn update(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;
    let service = ProductService::new(&state, &auth);

    let existing = match service.find(&id).await {
        Ok(product) => product,
        Err(err) => {
            return detail_error(
                err,
                "product",
                AdminUserView::from(&auth),
                ("/products", "Back to products"),
            );
        }
    };

    let payload = match form.validate(FormMode::Edit) {
        Ok(payload) => payload,
        Err(errors) => {
            let mut page = ProductFormTemplate::new(&auth, form, Some(&existing));
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response());
        }
    };

    match service.update(&id, payload).await {
        Ok(product) => {
            set_flash(&session, Flash::success(format!("Product \"{}\" updated", product.title)))
                .await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(err) => {
            let status = failure_status(&err);
            let mut page = ProductFormTemplate::new(&auth, form, Some(&existing));
            page.error = Some(mutation_error(err, "Failed to update product")?);
            Ok((status, render(&page)).into_response())
        }
    }
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip(auth, state, session), fields(product_id = %id))]
async fn delete(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let flash = match ProductService::new(&state, &auth).delete(&id).await {
        Ok(()) => Flash::success("Product deleted"),
        Err(err) => Flash::error(mutation_error(err, "Failed to delete product")?),
    };
    set_flash(&session, flash).await;
    Ok(Redirect::to("/products"))
}

async fn read_form(multipart: Multipart) -> Result<ProductForm, AppError> {
    ProductForm::from_multipart(multipart)
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid product form: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Asset;

    fn product(stock: Option<u32>) -> Product {
        Product {
            id: ProductId::new("665f1c2e9b1d8a0012ab34cd"),
            title: "Linen Shirt".to_string(),
            description: Some(
                "A breathable linen shirt cut for summer days with a relaxed fit and shell buttons"
                    .to_string(),
            ),
            price: 1249.5,
            product_type: ProductType::Physical,
            stock,
            images: vec![Asset {
                url: "https://cdn.example.com/shirt.jpg".to_string(),
                public_id: None,
            }],
            file: None,
            sizes: vec!["M".to_string()],
            colors: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_row_view_formats_cells() {
        let row = ProductRowView::from(&product(Some(3)));
        assert_eq!(row.price, "$1,249.50");
        assert_eq!(row.stock, "3 (Low)");
        assert_eq!(row.stock_class, "text-yellow-500");
        assert_eq!(
            row.description,
            "A breathable linen shirt cut for summer days with a..."
        );
        assert_eq!(
            row.image_url.as_deref(),
            Some("https://cdn.example.com/shirt.jpg")
        );
    }

    #[test]
    fn test_row_view_untracked_stock() {
        let row = ProductRowView::from(&product(None));
        assert_eq!(row.stock, "Unlimited");
    }
}
