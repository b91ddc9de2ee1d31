use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use dxf_nest::entity::Drawing;
use dxf_nest::error::NestError;
use dxf_nest::export;
use dxf_nest::packer;
use dxf_nest::types::{PackConfig, PackingResult, Part};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct SheetSize {
    width: f64,
    height: f64,
}

/// One part request: either bare bounding-box dimensions in mm, or an
/// embedded parsed drawing to run through the normalization pipeline.
#[derive(Deserialize, Serialize)]
struct PartRequest {
    name: String,
    #[serde(default = "default_qty")]
    quantity: u32,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    drawing: Option<Drawing>,
}

fn default_qty() -> u32 {
    1
}

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    sheet: SheetSize,
    parts: Vec<PartRequest>,
    #[serde(default = "default_true")]
    allow_rotation: bool,
    #[serde(default)]
    allow_mirroring: bool,
    #[serde(default)]
    edge_gap: f64,
    #[serde(default)]
    part_spacing: f64,
    /// When set, the response carries the serialized DXF text per sheet.
    #[serde(default)]
    include_dxf: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
struct PartSummary {
    name: String,
    width: f64,
    height: f64,
    units: &'static str,
    quantity: u32,
}

#[derive(Serialize)]
struct OptimizeResponse {
    #[serde(flatten)]
    result: PackingResult,
    parts: Vec<PartSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dxf: Option<Vec<String>>,
}

fn build_part(req: &PartRequest) -> Result<Part, (StatusCode, String)> {
    if req.quantity == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("part '{}': quantity must be non-zero", req.name),
        ));
    }
    if let Some(drawing) = &req.drawing {
        return Part::from_drawing(&req.name, drawing, req.quantity).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("part '{}': {}", req.name, e),
            )
        });
    }
    match (req.width, req.height) {
        (Some(width), Some(height)) if width > 0.0 && height > 0.0 => {
            Ok(Part::from_size(&req.name, width, height, req.quantity))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!(
                "part '{}': needs either a drawing or positive width and height",
                req.name
            ),
        )),
    }
}

fn error_status(err: &NestError) -> StatusCode {
    match err {
        NestError::ParseFailure(_) | NestError::InvalidSheetConfig(_) => StatusCode::BAD_REQUEST,
        NestError::UnplaceablePart { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        NestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let parts: Vec<Part> = req
        .parts
        .iter()
        .map(build_part)
        .collect::<Result<Vec<_>, _>>()?;

    let config = PackConfig {
        sheet_width: req.sheet.width,
        sheet_height: req.sheet.height,
        allow_rotation: req.allow_rotation,
        allow_mirroring: req.allow_mirroring,
        edge_gap: req.edge_gap,
        part_spacing: req.part_spacing,
    };

    let result = packer::pack(&parts, &config).map_err(|e| {
        tracing::warn!(error = %e, "optimization failed");
        (error_status(&e), e.to_string())
    })?;

    let dxf = req.include_dxf.then(|| {
        result
            .sheets
            .iter()
            .map(|sheet| export::export_sheet(sheet, &parts))
            .collect()
    });

    let response = OptimizeResponse {
        parts: parts
            .iter()
            .map(|p| PartSummary {
                name: p.name.clone(),
                width: p.width,
                height: p.height,
                units: p.units.name(),
                quantity: p.quantity,
            })
            .collect(),
        result,
        dxf,
    };

    Ok(Json(response))
}

#[tokio::main]
async fn main() {
    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
