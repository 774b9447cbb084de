//! rustls-backed TLS upgrade for https scoring endpoints.

use crate::client::BoxedIoStream;
use el_core::EngineError;
use el_core::EngineResult;
use rustls::ClientConfig;
use rustls::ClientConnection;
use rustls::RootCertStore;
use rustls::StreamOwned;
use rustls::pki_types::ServerName;
use std::net::TcpStream;
use std::sync::Arc;

pub(crate) fn connect(mut stream: TcpStream, host: &str) -> EngineResult<BoxedIoStream> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_owned()).map_err(|error| {
        EngineError::new(
            "score.tls_server_name_invalid",
            format!("invalid TLS server name `{host}`: {error}"),
        )
    })?;

    let mut connection = ClientConnection::new(Arc::new(config), server_name).map_err(|error| {
        EngineError::new(
            "score.tls_init_failed",
            format!("failed to initialize TLS connection for `{host}`: {error}"),
        )
    })?;

    connection.complete_io(&mut stream).map_err(|error| {
        EngineError::new(
            "score.tls_handshake_failed",
            format!("TLS handshake failed for `{host}`: {error}"),
        )
    })?;

    Ok(Box::new(StreamOwned::new(connection, stream)))
}
