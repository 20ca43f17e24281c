//! Request dispatch for host messages

use pivot_types::{
    now, EngineRequest, EngineResponse, ErrorInfo, Granularity, MessageId, MessageResult, Request,
    Response,
};

use crate::aggregate::{aggregate, validate_spec};
use crate::bucket::bucket_value;
use crate::chart::build_chart;
use crate::error::{EngineError, Result};
use crate::format::format_value;
use crate::keys::extract_keys;
use crate::segments::limit_segments;

/// Run one request payload
pub fn handle(payload: &EngineRequest) -> Result<EngineResponse> {
    let response = match payload {
        EngineRequest::Aggregate(req) => {
            validate_spec(&req.spec)?;
            EngineResponse::Aggregate(aggregate(&req.rows, &req.spec).into_table())
        }
        EngineRequest::Chart(req) => {
            EngineResponse::Chart(build_chart(&req.rows, &req.spec, &req.projection)?)
        }
        EngineRequest::Format(req) => EngineResponse::Format {
            values: req
                .values
                .iter()
                .map(|v| format_value(v, &req.options))
                .collect(),
        },
        EngineRequest::LimitSegments(req) => EngineResponse::LimitSegments(limit_segments(
            &req.rows,
            &req.segment_field,
            &req.metric_field,
            req.max_segments,
        )),
        EngineRequest::Bucket(req) => {
            let granularity = Granularity::from(req.granularity.clone());
            EngineResponse::Bucket {
                buckets: req
                    .values
                    .iter()
                    .map(|v| bucket_value(v, &granularity, req.alt_hour_groups))
                    .collect(),
            }
        }
        EngineRequest::ExtractKeys(req) => EngineResponse::ExtractKeys(extract_keys(
            &req.rows,
            &req.row_key_field,
            &req.column_key_field,
        )),
    };
    Ok(response)
}

/// Run a request and wrap the outcome in a response envelope
pub fn dispatch(request: &Request<EngineRequest>) -> Response<EngineResponse> {
    let started = now();
    let result = match handle(&request.payload) {
        Ok(data) => MessageResult::ok(data),
        Err(err) => {
            log::warn!("request {} failed: {err}", request.id);
            MessageResult::Error {
                error: ErrorInfo::from(&err),
            }
        }
    };
    respond(request.id.clone(), started, result)
}

/// Decode a JSON request, run it and encode the response.
///
/// Malformed messages produce an error response carrying the request id
/// when one can be recovered.
pub fn handle_message(message: &str) -> String {
    let started = now();
    let response = match serde_json::from_str::<Request<EngineRequest>>(message) {
        Ok(request) => dispatch(&request),
        Err(e) => {
            let err = EngineError::MalformedMessage(e);
            log::warn!("{err}");
            respond(
                recover_id(message),
                started,
                MessageResult::Error {
                    error: ErrorInfo::from(&err),
                },
            )
        }
    };
    encode(&response)
}

fn respond(
    id: MessageId,
    started: u64,
    result: MessageResult<EngineResponse>,
) -> Response<EngineResponse> {
    let finished = now();
    Response {
        id,
        timestamp: finished,
        execution_time_ms: u32::try_from(finished.saturating_sub(started)).unwrap_or(u32::MAX),
        result,
    }
}

fn recover_id(message: &str) -> MessageId {
    serde_json::from_str::<serde_json::Value>(message)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .unwrap_or_default()
}

fn encode(response: &Response<EngineResponse>) -> String {
    match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            let err = EngineError::Serialize(e);
            log::warn!("{err}");
            let fallback: Response<EngineResponse> = Response {
                id: response.id.clone(),
                timestamp: response.timestamp,
                execution_time_ms: response.execution_time_ms,
                result: MessageResult::Error {
                    error: ErrorInfo::from(&err),
                },
            };
            serde_json::to_string(&fallback).unwrap_or_default()
        }
    }
}
