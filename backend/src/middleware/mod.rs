//! Request middleware: trace-id propagation and latency recording.

mod timing;
mod trace_id;

pub use timing::timing_middleware;
pub use trace_id::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
