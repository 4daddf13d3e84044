use contract_scanner::adapters::model::KEY_NOT_SET;
use contract_scanner::config::{ExplorerConfig, ModelConfig};
use contract_scanner::core::scanner::SOURCE_UNAVAILABLE;
use contract_scanner::domain::ports::VerdictCache;
use contract_scanner::{
    evaluate, ContractAnalyzer, Credentials, ExplorerClient, FileVerdictCache, LocalStorage,
    MemoryCredentials, MemoryVerdictCache, Scanner, ScannerConfig, Verdict,
};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn config_for(server: &MockServer) -> ScannerConfig {
    ScannerConfig {
        explorer: ExplorerConfig {
            base_url: server.url("/api"),
            ..ExplorerConfig::default()
        },
        model: ModelConfig {
            endpoint: server.url("/v1/chat/completions"),
            ..ModelConfig::default()
        },
        ..ScannerConfig::default()
    }
}

fn both_keys() -> Credentials {
    Credentials::new("EXPLORER_KEY", "sk-test")
}

fn scanner_with(
    server: &MockServer,
    cache: Arc<dyn VerdictCache>,
    credentials: Credentials,
) -> Scanner {
    Scanner::from_config(
        &config_for(server),
        cache,
        Arc::new(MemoryCredentials::new(credentials)),
    )
    .unwrap()
}

fn token_list(count: usize) -> serde_json::Value {
    let result: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "tokenName": format!("Token {}", i),
                "contractAddress": format!("0x{:040x}", i),
            })
        })
        .collect();

    serde_json::json!({"status": "1", "message": "OK", "result": result})
}

fn source_body(code: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "1",
        "message": "OK",
        "result": [{"SourceCode": code, "ContractName": "Token"}]
    })
}

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_second_analysis_within_ttl_makes_no_requests() {
    let server = MockServer::start();
    let source_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api")
            .query_param("action", "getsourcecode")
            .query_param("address", "0xabc");
        then.status(200).json_body(source_body("contract Token {}"));
    });
    let model_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(chat_reply("Owner can mint unlimited tokens: high-risk."));
    });

    let scanner = scanner_with(&server, Arc::new(MemoryVerdictCache::new()), both_keys());

    let first = scanner.analyze_contract("0xabc").await;
    let second = scanner.analyze_contract("0xabc").await;

    assert_eq!(first, Verdict::PossibleScam);
    assert_eq!(second, first);
    source_mock.assert_hits(1);
    model_mock.assert_hits(1);
}

#[tokio::test]
async fn test_missing_explorer_key_yields_nothing() {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.any_request();
        then.status(200).json_body(token_list(3));
    });

    let explorer = ExplorerClient::new(&config_for(&server).explorer).unwrap();
    let no_explorer_key = Credentials::new("", "sk-test");

    assert!(explorer.fetch_new_pairs(&no_explorer_key).await.is_empty());
    assert_eq!(explorer.fetch_source(&no_explorer_key, "0xabc").await, "");

    let scanner = scanner_with(
        &server,
        Arc::new(MemoryVerdictCache::new()),
        no_explorer_key,
    );
    assert!(scanner.get_results().await.is_empty());

    any_request.assert_hits(0);
}

#[tokio::test]
async fn test_missing_model_key_sentinel_evaluates_safe() {
    let server = MockServer::start();
    let analyzer = ContractAnalyzer::new(&config_for(&server).model).unwrap();

    let analysis = analyzer
        .analyze(&Credentials::new("EXPLORER_KEY", ""), "contract Token {}")
        .await;

    assert_eq!(analysis, KEY_NOT_SET);
    // 關鍵字比對本身不認得 sentinel，這是刻意保留的行為
    assert_eq!(evaluate(&analysis), Verdict::Safe);
}

#[tokio::test]
async fn test_token_list_truncated_to_ten_in_order() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "tokenlist");
        then.status(200).json_body(token_list(15));
    });

    let explorer = ExplorerClient::new(&config_for(&server).explorer).unwrap();
    let pairs = explorer.fetch_new_pairs(&both_keys()).await;

    assert_eq!(pairs.len(), 10);
    let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
    let expected: Vec<String> = (1..=10).map(|i| format!("Token {}", i)).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_end_to_end_two_pairs() {
    let server = MockServer::start();
    let first_address = format!("0x{:040x}", 1);
    let second_address = format!("0x{:040x}", 2);

    server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "tokenlist");
        then.status(200).json_body(token_list(2));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api")
            .query_param("action", "getsourcecode")
            .query_param("address", first_address.as_str());
        then.status(200).json_body(serde_json::json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified"
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api")
            .query_param("action", "getsourcecode")
            .query_param("address", second_address.as_str());
        then.status(200).json_body(source_body("contract Token is ERC20 {}"));
    });
    let model_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("contract Token is ERC20 {}");
        then.status(200)
            .json_body(chat_reply("Standard ERC20 implementation, no issues found."));
    });

    let cache = MemoryVerdictCache::new();
    let scanner = scanner_with(&server, Arc::new(cache.clone()), both_keys());

    let results = scanner.get_results().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "Token 1");
    assert_eq!(
        results[0].verdict,
        Verdict::Unavailable(SOURCE_UNAVAILABLE.to_string())
    );
    assert_eq!(results[1].name, "Token 2");
    assert_eq!(results[1].verdict, Verdict::Safe);

    model_mock.assert_hits(1);
    assert!(!cache.contains(&first_address).await);
    assert!(cache.contains(&second_address).await);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_unavailable_source_is_retried_on_next_scan() {
    let server = MockServer::start();
    let mut not_indexed = server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "getsourcecode");
        then.status(200).json_body(source_body(""));
    });

    let cache = MemoryVerdictCache::new();
    let scanner = scanner_with(&server, Arc::new(cache.clone()), both_keys());

    assert_eq!(
        scanner.analyze_contract("0xabc").await,
        Verdict::Unavailable(SOURCE_UNAVAILABLE.to_string())
    );
    not_indexed.assert_hits(1);
    not_indexed.delete();

    server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "getsourcecode");
        then.status(200).json_body(source_body("contract Token {}"));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(chat_reply("Looks fine, standard ERC20."));
    });

    assert_eq!(scanner.analyze_contract("0xabc").await, Verdict::Safe);
    assert!(cache.contains("0xabc").await);
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let source_mock = server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "getsourcecode");
        then.status(200).json_body(source_body("contract Token {}"));
    });
    let model_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(chat_reply("Hidden transfer fee looks like a scam."));
    });

    {
        let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));
        let scanner = scanner_with(&server, Arc::new(cache), both_keys());
        assert_eq!(
            scanner.analyze_contract("0xabc").await,
            Verdict::PossibleScam
        );
    }

    let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));
    let scanner = scanner_with(&server, Arc::new(cache), both_keys());
    assert_eq!(
        scanner.analyze_contract("0xabc").await,
        Verdict::PossibleScam
    );

    source_mock.assert_hits(1);
    model_mock.assert_hits(1);
}

#[tokio::test]
async fn test_model_transport_failure_is_not_cached() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api");
        then.status(200).json_body(source_body("contract Token {}"));
    });

    let mut config = config_for(&server);
    config.model.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_string();
    config.model.timeout_seconds = 2;

    let cache = MemoryVerdictCache::new();
    let scanner = Scanner::from_config(
        &config,
        Arc::new(cache.clone()),
        Arc::new(MemoryCredentials::new(both_keys())),
    )
    .unwrap();

    let verdict = scanner.analyze_contract("0xabc").await;

    assert!(verdict.is_unavailable());
    assert_eq!(verdict.to_string(), "Error in OpenAI API request.");
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_corrupt_cache_file_is_replaced_on_first_write() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("verdicts.json"), br#"{"0xabc": {trunc"#).unwrap();

    let server = MockServer::start();
    let source_mock = server.mock(|when, then| {
        when.method(GET).path("/api").query_param("action", "getsourcecode");
        then.status(200).json_body(source_body("contract Token {}"));
    });
    let model_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(chat_reply("Standard ERC20, nothing unusual."));
    });

    let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));
    let scanner = scanner_with(&server, Arc::new(cache), both_keys());

    for _ in 0..3 {
        assert_eq!(scanner.analyze_contract("0xabc").await, Verdict::Safe);
    }

    source_mock.assert_hits(1);
    model_mock.assert_hits(1);
}
