//! # Stocktake API
//!
//! Service facade and wire types for the stocktake inventory HTTP surface.
//! The axum server in apps/stocktake-server stays a thin translation layer;
//! request validation, state access and robot-report fan-out live here.

mod dto;
mod error;
mod service;

pub use dto::{
    BinProgressView, OperationView, RecentOperationsView, RobotReportAck, RobotReportRequest,
    StartInventoryRequest, StartInventoryResponse, TaskProgressView,
};
pub use error::{ApiError, ErrorCode};
pub use service::InventoryApi;
