//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use metasidebar_server::{create_app, memory::SeedData, AppState, Config, MemoryMetadataApi};

pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        ..Config::default()
    }
}

pub(crate) fn test_server_for(config: Config, api: MemoryMetadataApi) -> TestServer {
    let state = AppState::new(config, api);
    TestServer::new(create_app(state, false)).expect("server")
}

/// Demo-seeded server plus a handle on its backing service.
pub(crate) fn setup_test_server() -> (TestServer, MemoryMetadataApi) {
    let api = MemoryMetadataApi::from_seed(SeedData::demo());
    let server = test_server_for(test_config(), api.clone());
    (server, api)
}
