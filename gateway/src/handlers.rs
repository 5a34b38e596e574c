//! Handler模块

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::connector::PgConnector;
use crate::state::AppState;
use common::errors::{AppError, ErrorBody};
use common::models::{
    GreetingRequest, GreetingResult, SchemasRequest, SchemasResult, SelectRequest, TableContent,
    TableContentRequest, TablesRequest, TablesResult, UpdateTableRequest,
};

/// 默认模式名
const DEFAULT_SCHEMA: &str = "public";

/// 根据请求构建数据访问组件（每个请求独立实例）
fn connector_for(state: &AppState, database: Option<&str>) -> PgConnector {
    let config = match database {
        Some(name) => state.config.database.with_database(name),
        None => state.config.database.clone(),
    };
    PgConnector::new(config, state.config.connect_timeout())
}

/// 根端点
#[utoipa::path(
    get,
    path = "/",
    tag = "greeting",
    responses(
        (status = 200, description = "问候消息", body = GreetingResult)
    )
)]
pub async fn root() -> Json<GreetingResult> {
    Json(GreetingResult {
        message: "Hello Hello World".to_string(),
    })
}

/// 按名字问候
#[utoipa::path(
    post,
    path = "/greet",
    tag = "greeting",
    request_body = GreetingRequest,
    responses(
        (status = 200, description = "问候消息", body = GreetingResult),
        (status = 400, description = "请求无效", body = ErrorBody)
    )
)]
pub async fn greet_by_name(
    Json(req): Json<GreetingRequest>,
) -> Result<Json<GreetingResult>, AppError> {
    req.validate()?;
    Ok(Json(GreetingResult {
        message: format!("Hello Hello {}", req.name),
    }))
}

/// 列出数据库中的所有模式
#[utoipa::path(
    post,
    path = "/schemas",
    tag = "tables",
    request_body = SchemasRequest,
    responses(
        (status = 200, description = "模式列表", body = SchemasResult),
        (status = 400, description = "目标数据库不存在或连接失败", body = ErrorBody)
    )
)]
pub async fn list_schemas(
    State(state): State<AppState>,
    Json(req): Json<SchemasRequest>,
) -> Result<Json<SchemasResult>, AppError> {
    let connector = connector_for(&state, req.database.as_deref());
    let schemas = connector.list_schemas().await?;
    Ok(Json(SchemasResult { schemas }))
}

/// 列出模式中的所有表
#[utoipa::path(
    post,
    path = "/tables",
    tag = "tables",
    request_body = TablesRequest,
    responses(
        (status = 200, description = "表列表", body = TablesResult),
        (status = 400, description = "连接失败", body = ErrorBody)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Json(req): Json<TablesRequest>,
) -> Result<Json<TablesResult>, AppError> {
    let schema = req.schema_name.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let connector = connector_for(&state, None);
    let tables = connector.list_tables(schema).await?;
    Ok(Json(TablesResult { tables }))
}

/// 读取表的全部内容
#[utoipa::path(
    post,
    path = "/table_content",
    tag = "tables",
    request_body = TableContentRequest,
    responses(
        (status = 200, description = "表内容", body = TableContent),
        (status = 400, description = "请求无效或查询失败", body = ErrorBody)
    )
)]
pub async fn table_content(
    State(state): State<AppState>,
    Json(req): Json<TableContentRequest>,
) -> Result<Json<TableContent>, AppError> {
    let table = req
        .target_table
        .as_deref()
        .ok_or_else(|| AppError::Validation("target_table is required".to_string()))?;
    let schema = req.target_schema.as_deref().unwrap_or(DEFAULT_SCHEMA);

    let connector = connector_for(&state, None);
    let content = connector.read_table(schema, table).await?;
    Ok(Json(content))
}

/// 按过滤条件批量更新表
#[utoipa::path(
    put,
    path = "/update_table",
    tag = "tables",
    request_body = UpdateTableRequest,
    responses(
        (status = 200, description = "更新成功"),
        (status = 400, description = "未知列、请求无效或更新失败", body = ErrorBody)
    )
)]
pub async fn update_table(
    State(state): State<AppState>,
    Json(req): Json<UpdateTableRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()?;
    let table = req
        .target_table
        .as_deref()
        .ok_or_else(|| AppError::Validation("target_table is required".to_string()))?;
    let schema = req.target_schema.as_deref().unwrap_or(DEFAULT_SCHEMA);

    let connector = connector_for(&state, None);
    connector.update_table(schema, table, &req.payload).await?;
    Ok(StatusCode::OK)
}

/// 执行只读原生 SQL 查询
#[utoipa::path(
    post,
    path = "/select",
    tag = "query",
    request_body = SelectRequest,
    responses(
        (status = 200, description = "查询结果", body = TableContent),
        (status = 400, description = "非 SELECT 语句或查询失败", body = ErrorBody)
    )
)]
pub async fn execute_select(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<TableContent>, AppError> {
    req.validate()?;
    let connector = connector_for(&state, None);
    let content = connector.execute_read_only(&req.sql_string).await?;
    Ok(Json(content))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
