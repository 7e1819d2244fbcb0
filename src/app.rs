//! Routes of the label service: the entry page and document generation.

use crate::document::{self, DOCX_CONTENT_TYPE, DOCX_FILENAME, DocumentError};
use crate::product::{CODE_LENGTH, GenerateRequest};
use crate::route;
use crate::router::{AppState, Request, Response, Router, access_log};
use crate::settings::Settings;
use crate::template::{self, INDEX_TEMPLATE, TemplateValue};
use std::collections::HashMap;

pub const PAGE_TITLE: &str = "Product Barcode Cards";

/// Build the application router with its state, routes and access log.
pub fn build_router(settings: Settings) -> Router {
    let mut router = Router::new();
    router.set_app_state(AppState::new(settings));
    router.add_post_middleware(access_log());

    route!(router,
        GET "/" => { index },
        POST "/generate_doc" => { generate_doc },
    );

    router
}

/// `GET /`: the product entry page.
pub async fn index(_request: Request, state: AppState) -> Response {
    let mut context = HashMap::new();
    context.insert("title".to_string(), TemplateValue::from(PAGE_TITLE));
    context.insert("code_max_length".to_string(), TemplateValue::from(CODE_LENGTH));
    context.insert(
        "symbology".to_string(),
        TemplateValue::from(state.settings.layout.symbology.name()),
    );
    context.insert("filename".to_string(), TemplateValue::from(DOCX_FILENAME));
    context.insert("debug".to_string(), TemplateValue::from(state.settings.debug));
    context.insert(
        "columns".to_string(),
        TemplateValue::List(
            ["Barcode", "Description", "SAP code", "Actions"]
                .into_iter()
                .map(TemplateValue::from)
                .collect(),
        ),
    );
    Response::html(template::render_str(INDEX_TEMPLATE, &context))
}

/// `POST /generate_doc`: validate the product list, then return the DOCX.
pub async fn generate_doc(request: Request, state: AppState) -> Response {
    let products = match GenerateRequest::from_json(&request.body) {
        Ok(parsed) => parsed.products,
        Err(e) => {
            log::warn!("Rejected /generate_doc request: {}", e);
            return Response::bad_request(e.to_string());
        }
    };
    log::info!("Generating document for {} product(s)", products.len());

    let layout = state.settings.layout.clone();
    let assembled =
        tokio::task::spawn_blocking(move || document::assemble(&products, &layout)).await;

    match assembled {
        Ok(Ok(bytes)) => Response::attachment(bytes, DOCX_CONTENT_TYPE, DOCX_FILENAME),
        Ok(Err(e @ DocumentError::Barcode { .. })) => {
            log::warn!("Document generation failed: {}", e);
            Response::unprocessable(e.to_string())
        }
        Ok(Err(e)) => {
            log::error!("Document generation failed: {}", e);
            Response::internal_error(e.to_string())
        }
        Err(e) => {
            log::error!("Document task failed: {}", e);
            Response::internal_error("document generation failed")
        }
    }
}
