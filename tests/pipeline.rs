use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dompatch::Patcher;
use dompatch_config_source::{ConfigurationSource, DataSource, StaticSource};
use dompatch_core_types::{Action, Configuration, Position};
use dompatch_event_bus::{DiagnosticKind, MemorySink};
use pretty_assertions::assert_eq;
use tokio::sync::Barrier;

const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Shop</title></head><body><div class="banner">Sale</div><main><h1>Products</h1><p>Price: 10 EUR</p></main></body></html>"#;

fn routes() -> DataSource {
    serde_yaml::from_str(
        r#"
datasource:
  urls:
    /products:
      - common
      - products
      - gone
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn patches_a_page_end_to_end() {
    let sink = MemorySink::new();
    let source = StaticSource::new(routes())
        .with_configuration(
            "common",
            Configuration::new(vec![
                Action::remove(".banner").with_priority(2),
                Action::alter("EUR", "euros"),
            ]),
        )
        .with_configuration(
            "products",
            Configuration::new(vec![Action::insert(
                ".banner",
                "<nav>menu</nav>",
                Position::After,
            )
            .with_priority(1)]),
        )
        .with_sink(sink.clone());
    let patcher = Patcher::new(Arc::new(source), sink.clone());

    let outcome = patcher
        .patch_location(PAGE, "https://shop.example.com/products?page=1")
        .await;

    assert_eq!(
        outcome.html,
        r#"<!DOCTYPE html>
<html><head><title>Shop</title></head><body><nav>menu</nav><main><h1>Products</h1><p>Price: 10 euros</p></main></body></html>"#
    );
    assert_eq!(outcome.report.total(), 3);
    assert_eq!(
        outcome.report.steps.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>(),
        vec!["alter", "insert", "remove"]
    );
    assert_eq!(sink.of_kind(DiagnosticKind::LoadError).len(), 1);
}

#[tokio::test]
async fn unknown_location_leaves_page_untouched() {
    let sink = MemorySink::new();
    let patcher = Patcher::new(Arc::new(StaticSource::new(routes())), sink.clone());

    let outcome = patcher.patch_location(PAGE, "/elsewhere").await;

    assert_eq!(outcome.html, PAGE);
    assert!(outcome.report.is_empty());
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, DiagnosticKind::ConfigurationError);
}

/// Every load waits until all loads have started.
struct GatedSource {
    barrier: Barrier,
}

#[async_trait]
impl ConfigurationSource for GatedSource {
    async fn load_configuration(&self, identifier: &str) -> Option<Configuration> {
        self.barrier.wait().await;
        Some(Configuration::new(vec![Action::remove(format!(
            "#{}",
            identifier
        ))]))
    }

    async fn resolve_configuration_identifiers(&self, _location: &str) -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }
}

#[tokio::test]
async fn configurations_load_concurrently_and_merge_in_order() {
    let source = GatedSource {
        barrier: Barrier::new(3),
    };
    let patcher = Patcher::new(Arc::new(source), MemorySink::new());

    let identifiers = patcher.resolve("/any").await;
    let merged = tokio::time::timeout(Duration::from_secs(5), patcher.load(&identifiers))
        .await
        .expect("loads did not run concurrently");

    assert_eq!(
        merged.actions,
        vec![
            Action::remove("#a"),
            Action::remove("#b"),
            Action::remove("#c")
        ]
    );
}
