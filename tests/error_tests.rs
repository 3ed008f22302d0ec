//! Tests for the error system.

use relay::error::*;

#[test]
fn error_api_creation() {
    let err = RelayError::api(404, "Not found");
    assert!(matches!(&err, RelayError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: RelayError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: RelayError::Authentication("bad-key".to_string()),
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: RelayError::RateLimited {
                retry_after_ms: Some(1000),
            },
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: RelayError::Timeout(5000),
            expected_category: ErrorCategory::Timeout,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::IncreaseTimeout,
        },
        Case {
            error: RelayError::Network(network_error),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryOnce,
        },
        Case {
            error: RelayError::Stream("connection reset".to_string()),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryOnce,
        },
        Case {
            error: RelayError::api(503, "Server unavailable"),
            expected_category: ErrorCategory::Server,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: RelayError::api(401, "Unauthorized"),
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: RelayError::api(418, "Teapot"),
            expected_category: ErrorCategory::Api,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: RelayError::Provider {
                provider: "responses".to_string(),
                message: "server_error: boom".to_string(),
            },
            expected_category: ErrorCategory::Api,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: RelayError::Configuration("bad-config".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: RelayError::Serialization(serde_error),
            expected_category: ErrorCategory::Serialization,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: RelayError::UnknownTool("close_account".to_string()),
            expected_category: ErrorCategory::ToolDispatch,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckToolRegistry,
        },
        Case {
            error: RelayError::arguments("pay_service", "missing required field 'amount'"),
            expected_category: ErrorCategory::ToolDispatch,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckToolRegistry,
        },
        Case {
            error: RelayError::tool("pay_service", "ledger offline"),
            expected_category: ErrorCategory::ToolExecution,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckToolImplementation,
        },
        Case {
            error: RelayError::contract("Missing required data"),
            expected_category: ErrorCategory::Contract,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckAgentInstructions,
        },
        Case {
            error: RelayError::LoopBudgetExceeded { max_turns: 16 },
            expected_category: ErrorCategory::Budget,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckAgentInstructions,
        },
        Case {
            error: RelayError::InvalidWorkflow("edges form a cycle".to_string()),
            expected_category: ErrorCategory::Workflow,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::FixWorkflowDefinition,
        },
        Case {
            error: RelayError::Cancelled,
            expected_category: ErrorCategory::Cancelled,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::None,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(case.error.is_retryable(), case.expected_retryable, "{}", case.error);
        assert_eq!(case.error.recovery_suggestion(), case.expected_recovery, "{}", case.error);
    }
}

#[test]
fn only_tool_execution_failures_keep_the_run_alive() {
    assert!(!RelayError::tool("get_balance", "offline").is_fatal_to_run());
    assert!(RelayError::UnknownTool("x".into()).is_fatal_to_run());
    assert!(RelayError::arguments("x", "bad").is_fatal_to_run());
    assert!(RelayError::LoopBudgetExceeded { max_turns: 2 }.is_fatal_to_run());
}

#[test]
fn budget_message_names_the_limit() {
    let err = RelayError::LoopBudgetExceeded { max_turns: 3 };
    assert_eq!(
        err.to_string(),
        "Loop budget exceeded: remote side still requesting calls after 3 turns"
    );
}

#[test]
fn categories_render_in_snake_case() {
    assert_eq!(ErrorCategory::ToolDispatch.to_string(), "tool_dispatch");
    assert_eq!("rate_limit".parse::<ErrorCategory>().unwrap(), ErrorCategory::RateLimit);
    assert_eq!(RecoverySuggestion::CheckToolRegistry.to_string(), "check_tool_registry");
}
