use super::config::SecureHeadersConfig;
use crate::error::{HeaderError, Result};
use crate::headers::{Overrides, SecurityHeader};
use crate::store::PolicyStore;
use axum::body::Body;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tower::Service;

/// Response extension marking that security headers were already attached.
///
/// A layer closer to the handler marks the response first, so an outer
/// app-wide layer leaves it alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureHeadersApplied;

/// Build a Tower layer that adds security headers to responses
///
/// Headers are built once from the store plus `config.overrides`; later
/// changes to the store do not affect an existing layer.
pub fn build_secure_headers_layer(
    store: &PolicyStore,
    config: &SecureHeadersConfig,
) -> Result<Option<SecureHeadersLayer>> {
    if !config.enabled {
        return Ok(None);
    }

    let overrides = (!config.overrides.is_empty()).then_some(&config.overrides);
    store.layer(overrides).map(Some)
}

impl PolicyStore {
    /// Build a layer from the current policy, with per-route overrides
    pub fn layer(&self, overrides: Option<&Overrides>) -> Result<SecureHeadersLayer> {
        let headers = self.build(overrides)?;
        SecureHeadersLayer::new(&headers)
    }
}

/// Tower layer that adds security headers
#[derive(Clone)]
pub struct SecureHeadersLayer {
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl SecureHeadersLayer {
    pub fn new(headers: &[SecurityHeader]) -> Result<Self> {
        let headers = headers
            .iter()
            .map(|header| {
                let name = HeaderName::from_bytes(header.name.as_bytes())
                    .map_err(|_| invalid_header(header))?;
                let value = HeaderValue::from_str(&header.value).map_err(|_| invalid_header(header))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = headers.len(), "Built secure headers layer");

        Ok(Self {
            headers: headers.into(),
        })
    }

    /// Headers this layer attaches, in emission order
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

fn invalid_header(header: &SecurityHeader) -> HeaderError {
    HeaderError::InvalidHeaderValue {
        name: header.name.clone(),
        value: header.value.clone(),
    }
}

impl<S> tower::Layer<S> for SecureHeadersLayer {
    type Service = SecureHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecureHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Tower service that adds security headers
#[derive(Clone)]
pub struct SecureHeadersService<S> {
    inner: S,
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl<S> Service<Request> for SecureHeadersService<S>
where
    S: Service<Request, Response = Response<Body>> + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let headers = Arc::clone(&self.headers);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            attach_headers(&mut response, &headers);
            Ok(response)
        })
    }
}

fn attach_headers<B>(response: &mut Response<B>, headers: &[(HeaderName, HeaderValue)]) {
    if response.extensions().get::<SecureHeadersApplied>().is_some() {
        return;
    }

    let map = response.headers_mut();
    for (name, value) in headers {
        map.insert(name.clone(), value.clone());
    }
    response.extensions_mut().insert(SecureHeadersApplied);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{HeaderKind, ValueMap};
    use axum::http::StatusCode;

    fn empty_response() -> Response<Body> {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_disabled_layer() {
        let config = SecureHeadersConfig {
            enabled: false,
            ..Default::default()
        };
        let layer = build_secure_headers_layer(&PolicyStore::new(), &config).unwrap();
        assert!(layer.is_none());
    }

    #[test]
    fn test_default_headers_attached() {
        let layer = PolicyStore::new().layer(None).unwrap();
        let mut response = empty_response();
        attach_headers(&mut response, layer.headers());

        assert_eq!(layer.headers().len(), 8);
        assert_eq!(
            response.headers().get("x-content-type-options"),
            Some(&HeaderValue::from_static("nosniff"))
        );
        assert_eq!(
            response.headers().get("strict-transport-security"),
            Some(&HeaderValue::from_static("max-age=31536000; includeSubDomains"))
        );
        assert!(response.extensions().get::<SecureHeadersApplied>().is_some());
    }

    #[test]
    fn test_marked_response_is_left_alone() {
        let layer = PolicyStore::new().layer(None).unwrap();
        let mut response = empty_response();
        response.extensions_mut().insert(SecureHeadersApplied);
        attach_headers(&mut response, layer.headers());

        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_config_overrides_are_applied() {
        let config = SecureHeadersConfig::builder()
            .disable_header(HeaderKind::Hpkp)
            .override_header(HeaderKind::XFrameOptions, ValueMap::new().with("value", "deny"))
            .build();
        let layer = build_secure_headers_layer(&PolicyStore::new(), &config)
            .unwrap()
            .unwrap();

        let names: Vec<&str> = layer.headers().iter().map(|(name, _)| name.as_str()).collect();
        assert!(!names.contains(&"public-key-pins"));
        let frame = layer
            .headers()
            .iter()
            .find(|(name, _)| name == "x-frame-options")
            .map(|(_, value)| value.clone());
        assert_eq!(frame, Some(HeaderValue::from_static("deny")));
    }

    #[test]
    fn test_invalid_override_fails_layer_construction() {
        let config = SecureHeadersConfig::builder()
            .override_header(HeaderKind::XFrameOptions, ValueMap::new().with("value", "bogus"))
            .build();
        assert!(build_secure_headers_layer(&PolicyStore::new(), &config).is_err());
    }

    #[test]
    fn test_unencodable_value_is_rejected() {
        let header = SecurityHeader {
            name: "X-Frame-Options".to_string(),
            value: "allow-from https://example.com/\n".to_string(),
        };
        assert!(matches!(
            SecureHeadersLayer::new(&[header]),
            Err(HeaderError::InvalidHeaderValue { .. })
        ));
    }
}
