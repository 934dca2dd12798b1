use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::cluster::host::Host;
use crate::routing::ring::TokenRing;
use crate::routing::Token;

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

pub(crate) fn mock_host(id: u16, datacenter: &str, rack: &str) -> Arc<Host> {
    Arc::new(Host {
        address: SocketAddr::from(([255, 255, 255, 255], id)),
        datacenter: Some(datacenter.to_owned()),
        rack: Some(rack.to_owned()),
    })
}

/// Seven hosts across two datacenters, with their token ownership:
///
/// | host | dc | rack | tokens        |
/// |------|----|------|---------------|
/// | A    | eu | r1   | 50, 250, 400  |
/// | B    | eu | r1   | 100, 600, 900 |
/// | C    | eu | r1   | 300, 650, 700 |
/// | D    | us | r1   | 350, 550      |
/// | E    | us | r1   | 150, 750      |
/// | F    | us | r2   | 200, 450      |
/// | G    | eu | r2   | 500, 800      |
pub(crate) fn mock_layout() -> Vec<(Arc<Host>, Vec<i64>)> {
    vec![
        (mock_host(1, "eu", "r1"), vec![50, 250, 400]),
        (mock_host(2, "eu", "r1"), vec![100, 600, 900]),
        (mock_host(3, "eu", "r1"), vec![300, 650, 700]),
        (mock_host(4, "us", "r1"), vec![350, 550]),
        (mock_host(5, "us", "r1"), vec![150, 750]),
        (mock_host(6, "us", "r2"), vec![200, 450]),
        (mock_host(7, "eu", "r2"), vec![500, 800]),
    ]
}

pub(crate) fn mock_host_tokens() -> HashMap<Arc<Host>, Vec<String>> {
    mock_layout()
        .into_iter()
        .map(|(host, tokens)| {
            let raw = tokens.into_iter().map(|t| t.to_string()).collect();
            (host, raw)
        })
        .collect()
}

/// The ring of [`mock_layout`], plus its hosts in A..G order.
pub(crate) fn mock_ring() -> (TokenRing<Arc<Host>>, Vec<Arc<Host>>) {
    let layout = mock_layout();
    let hosts: Vec<Arc<Host>> = layout.iter().map(|(host, _)| Arc::clone(host)).collect();
    let entries = layout.into_iter().flat_map(|(host, tokens)| {
        tokens
            .into_iter()
            .map(move |t| (Token::new(t), Arc::clone(&host)))
    });
    (TokenRing::new(entries), hosts)
}
