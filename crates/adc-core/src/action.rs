//! The tagged response type returned across the public action surface
//! (§6, §9: "cyclic, dynamically-typed response dicts → tagged variants").

use serde::Serialize;
use serde_json::Value;

use crate::error::ControllerError;

/// A `connect`/`disconnect`/.../`zeroing` call result, modeled as the sum
/// type the design note in §9 calls for: `Success(T)` versus
/// `Error { message, motor_id }`. `T` carries whatever extra fields that
/// action reports (a [`crate::orchestrator::MoveOutcome`], a
/// [`MotorStatus`](crate::controller::MotorStatus), or `()` for actions
/// with nothing to report beyond success).
#[derive(Debug, Clone)]
pub enum ActionResponse<T> {
    /// The action completed; `extra` is serialized alongside `status` and
    /// `message` at the wire boundary (§6).
    Success {
        /// Human-readable summary of what happened.
        message: String,
        /// Action-specific payload.
        extra: T,
    },
    /// The action failed; no motion was attempted beyond whatever had
    /// already been dispatched in parallel (§7).
    Error {
        /// The failure's display message.
        message: String,
        /// The motor this failure pertains to, if it is motor-scoped.
        motor_id: Option<i32>,
    },
}

impl<T: Serialize> ActionResponse<T> {
    /// Builds a success response from `extra`, with `message` describing
    /// what happened.
    pub fn success(message: impl Into<String>, extra: T) -> Self {
        ActionResponse::Success {
            message: message.into(),
            extra,
        }
    }

    /// Serializes this response into the `{status, message, ...extras}`
    /// shape of §6, suitable for an embedding binary (HTTP,
    /// IPC, CLI — all out of scope here) to hand to a client verbatim.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ActionResponse::Success { message, extra } => {
                let mut value = serde_json::json!({
                    "status": "success",
                    "message": message,
                });
                if let Ok(Value::Object(fields)) = serde_json::to_value(extra) {
                    if let Value::Object(map) = &mut value {
                        map.extend(fields);
                    }
                }
                value
            }
            ActionResponse::Error { message, motor_id } => serde_json::json!({
                "status": "error",
                "message": message,
                "motor_id": motor_id,
            }),
        }
    }

    /// `true` iff this is a `Success` response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResponse::Success { .. })
    }
}

impl<T> From<ControllerError> for ActionResponse<T> {
    fn from(err: ControllerError) -> Self {
        let motor_id = err.motor_id();
        ActionResponse::Error {
            message: err.to_string(),
            motor_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_with_flattened_extras() {
        let response = ActionResponse::success("ok", serde_json::json!({ "adc_deg": 30.0 }));
        let value = response.to_json();
        assert_eq!(value["status"], "success");
        assert_eq!(value["adc_deg"], 30.0);
    }

    #[test]
    fn error_carries_motor_id() {
        let response: ActionResponse<()> = ControllerError::InvalidMotorId(7).into();
        let value = response.to_json();
        assert_eq!(value["status"], "error");
        assert!(value["message"].as_str().unwrap().contains('7'));
    }
}
