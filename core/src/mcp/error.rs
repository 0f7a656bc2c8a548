//! Error code table
//!
//! Protocol codes follow JSON-RPC 2.0. Domain codes live in the -4000x band
//! and are reported in `error.data` next to the protocol code.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    EngineUnreachable,
    SynthesisFailed,
    PlaybackFailed,
    FileWriteFailed,
    Configuration,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::EngineUnreachable => -40001,
            ErrorCode::SynthesisFailed => -40002,
            ErrorCode::PlaybackFailed => -40003,
            ErrorCode::FileWriteFailed => -40004,
            ErrorCode::Configuration => -40005,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "parse_error",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::MethodNotFound => "method_not_found",
            ErrorCode::InvalidParams => "invalid_params",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::EngineUnreachable => "engine_unreachable",
            ErrorCode::SynthesisFailed => "synthesis_failed",
            ErrorCode::PlaybackFailed => "playback_failed",
            ErrorCode::FileWriteFailed => "file_write_failed",
            ErrorCode::Configuration => "configuration_error",
        }
    }

    /// Domain codes are sent to clients as `InternalError`
    pub fn is_domain(self) -> bool {
        self.code() <= -40000
    }

    /// Code placed in the `code` field of a JSON-RPC error
    pub fn wire_code(self) -> i32 {
        if self.is_domain() {
            ErrorCode::InternalError.code()
        } else {
            self.code()
        }
    }

    /// `error.data` payload for domain errors
    pub fn data(self) -> Option<Value> {
        self.is_domain().then(|| {
            json!({
                "kind": self.kind(),
                "domainCode": self.code(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_codes_are_sent_as_is() {
        assert_eq!(ErrorCode::ParseError.wire_code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.wire_code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.wire_code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.wire_code(), -32602);
        assert!(ErrorCode::InvalidParams.data().is_none());
    }

    #[test]
    fn domain_codes_are_sent_as_internal_error() {
        for code in [
            ErrorCode::EngineUnreachable,
            ErrorCode::SynthesisFailed,
            ErrorCode::PlaybackFailed,
            ErrorCode::FileWriteFailed,
            ErrorCode::Configuration,
        ] {
            assert_eq!(code.wire_code(), -32603);
            let data = code.data().unwrap();
            assert_eq!(data["domainCode"], code.code());
            assert_eq!(data["kind"], code.kind());
        }
    }
}
