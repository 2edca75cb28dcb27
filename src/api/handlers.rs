//! REST handlers
//!
//! Synchronous service calls go through [`blocking`]; the async lifecycle
//! operations are awaited directly.

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery, CurrentUser, blocking};
use crate::context::AppContext;
use crate::core::{
    HistoryEntry, Notification, NotificationId, Status, Ticket, TicketDraft, TicketId, UserId,
};
use crate::error::ServiceDeskError;
use crate::reports::{RECENT_LIMIT, ReportFilter, TicketStats};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type Ctx = State<Arc<AppContext>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub technician_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

fn ticket_id(raw: &str) -> Result<TicketId, ServiceDeskError> {
    TicketId::parse_str(raw)
        .map_err(|_| ServiceDeskError::validation(format!("Invalid ticket id '{raw}'")))
}

fn notification_id(raw: &str) -> Result<NotificationId, ServiceDeskError> {
    NotificationId::parse_str(raw)
        .map_err(|_| ServiceDeskError::validation(format!("Invalid notification id '{raw}'")))
}

#[allow(clippy::unused_async)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn create_ticket(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    ApiJson(draft): ApiJson<TicketDraft>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let ticket = blocking(&ctx, move |ctx| ctx.service.create(draft, &user)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets(State(ctx): Ctx, CurrentUser(user): CurrentUser) -> ApiResult<Vec<Ticket>> {
    Ok(Json(blocking(&ctx, move |ctx| ctx.reports.visible_tickets(&user)).await?))
}

pub async fn recent_tickets(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<RecentParams>,
) -> ApiResult<Vec<Ticket>> {
    let limit = params.limit.unwrap_or(RECENT_LIMIT);
    Ok(Json(
        blocking(&ctx, move |ctx| ctx.reports.recent_tickets(&user, limit)).await?,
    ))
}

pub async fn completed_tickets(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Ticket>> {
    Ok(Json(blocking(&ctx, move |ctx| ctx.reports.completed_tickets(&user)).await?))
}

pub async fn ticket_stats(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    ApiQuery(filter): ApiQuery<ReportFilter>,
) -> ApiResult<TicketStats> {
    Ok(Json(
        blocking(&ctx, move |ctx| ctx.reports.ticket_stats(&user, &filter)).await?,
    ))
}

pub async fn get_ticket(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Ticket> {
    let id = ticket_id(&id)?;
    Ok(Json(blocking(&ctx, move |ctx| ctx.service.ticket(&id, &user)).await?))
}

pub async fn delete_ticket(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.service.delete_ticket(&ticket_id(&id)?, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_ticket(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AssignRequest>,
) -> ApiResult<Ticket> {
    let ticket = ctx
        .service
        .assign(&ticket_id(&id)?, &request.technician_id, &user)
        .await?;
    Ok(Json(ticket))
}

pub async fn update_status(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Ticket> {
    let status: Status = request.status.parse()?;
    let ticket = ctx
        .service
        .update_status(&ticket_id(&id)?, status, &user, request.comment)
        .await?;
    Ok(Json(ticket))
}

pub async fn ticket_history(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<HistoryEntry>> {
    let id = ticket_id(&id)?;
    Ok(Json(blocking(&ctx, move |ctx| ctx.service.history(&id, &user)).await?))
}

pub async fn list_notifications(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Notification>> {
    Ok(Json(
        blocking(&ctx, move |ctx| ctx.service.notifications_for(&user)).await?,
    ))
}

pub async fn unread_count(State(ctx): Ctx, CurrentUser(user): CurrentUser) -> ApiResult<CountResponse> {
    let count = blocking(&ctx, move |ctx| ctx.service.unread_count(&user)).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn mark_all_read(State(ctx): Ctx, CurrentUser(user): CurrentUser) -> ApiResult<CountResponse> {
    let count = blocking(&ctx, move |ctx| ctx.service.mark_all_read(&user)).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn read_notification(
    State(ctx): Ctx,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    let id = notification_id(&id)?;
    Ok(Json(
        blocking(&ctx, move |ctx| ctx.service.read_notification(&id, &user)).await?,
    ))
}
