use async_trait::async_trait;
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, WWW_AUTHENTICATE},
};
use tracing::{debug, instrument, trace};

use crate::{
    ImageCommandEntry, ImageError, ImageReference, Platform, RegistryConfig,
    resolver::{
        ImageResolver,
        auth::{TokenResponse, parse_challenge},
        manifest::{ImageConfig, Manifest, manifest_accept, select_platform},
    },
};

/// Resolver speaking the OCI distribution API over HTTP(S).
///
/// Resolution walks `manifest (index) → platform manifest → config blob` and reads the
/// `Entrypoint` / `Cmd` of the config. Registries requiring anonymous bearer tokens are
/// supported; credentials are not.
pub struct RegistryResolver {
    client: Client,
    platform: Platform,
    config: RegistryConfig,
}

impl RegistryResolver {
    /// Create a resolver for `platform`.
    pub fn new(platform: Platform, config: RegistryConfig) -> Result<Self, ImageError> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            platform,
            config,
        })
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    fn url(&self, reference: &ImageReference, kind: &str, id: &str) -> String {
        format!(
            "{scheme}://{host}/v2/{repo}/{kind}/{id}",
            scheme = self.config.scheme_for(reference.registry()),
            host = reference.api_host(),
            repo = reference.repository(),
        )
    }

    /// GET `url`, performing the bearer-token dance once on `401`.
    ///
    /// `token` carries the bearer token across the requests of one resolution.
    async fn fetch(
        &self,
        token: &mut Option<String>,
        reference: &ImageReference,
        url: &str,
        accept: &str,
    ) -> Result<Vec<u8>, ImageError> {
        let mut retried = false;
        loop {
            let mut request = self.client.get(url).header(ACCEPT, accept);
            if let Some(token) = token.as_deref() {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;
            let status = response.status();
            trace!(url, status = status.as_u16(), "registry response");

            if status == StatusCode::UNAUTHORIZED && !retried {
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_challenge)
                    .ok_or_else(|| {
                        ImageError::Unauthorized(format!("{url}: no bearer challenge offered"))
                    })?;
                let scope = challenge
                    .scope
                    .unwrap_or_else(|| format!("repository:{}:pull", reference.repository()));
                *token = Some(
                    self.token(&challenge.realm, challenge.service.as_deref(), &scope)
                        .await?,
                );
                retried = true;
                continue;
            }
            if !status.is_success() {
                return Err(ImageError::Registry {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            return Ok(response.bytes().await?.to_vec());
        }
    }

    /// Request an anonymous pull token from the challenge realm.
    async fn token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: &str,
    ) -> Result<String, ImageError> {
        let mut params = vec![("scope", scope)];
        if let Some(service) = service {
            params.push(("service", service));
        }
        let url = Url::parse_with_params(realm, &params)
            .map_err(|e| ImageError::Unauthorized(format!("invalid token realm {realm:?}: {e}")))?;

        debug!(realm, scope, "requesting registry token");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ImageError::Unauthorized(format!(
                "token endpoint {realm} returned {}",
                response.status()
            )));
        }
        response
            .json::<TokenResponse>()
            .await?
            .into_token()
            .ok_or_else(|| ImageError::Unauthorized(format!("token endpoint {realm} issued no token")))
    }
}

#[async_trait]
impl ImageResolver for RegistryResolver {
    fn name(&self) -> &'static str {
        "registry"
    }

    #[instrument(level = "debug", skip(self, reference), fields(image = %reference, platform = %self.platform))]
    async fn resolve(&self, reference: &ImageReference) -> Result<ImageCommandEntry, ImageError> {
        let mut token = None;
        let accept = manifest_accept();
        let not_found = || ImageError::PlatformNotFound {
            reference: reference.to_string(),
            platform: self.platform.to_string(),
        };

        let url = self.url(reference, "manifests", reference.manifest_ref());
        let body = self.fetch(&mut token, reference, &url, &accept).await?;

        let (config, from_index) = match Manifest::parse(&body)? {
            Manifest::Image { config } => (config, false),
            Manifest::Index(entries) => {
                let selected = select_platform(&entries, &self.platform).ok_or_else(not_found)?;
                trace!(digest = %selected.digest, media_type = ?selected.media_type, "selected platform manifest");

                let url = self.url(reference, "manifests", &selected.digest);
                let body = self.fetch(&mut token, reference, &url, &accept).await?;
                match Manifest::parse(&body)? {
                    Manifest::Image { config } => (config, true),
                    Manifest::Index(_) => {
                        return Err(ImageError::InvalidManifest(format!(
                            "{url}: nested index is not supported"
                        )));
                    }
                }
            }
        };

        let accept_config = config.media_type.clone().unwrap_or_else(|| "*/*".to_string());
        let url = self.url(reference, "blobs", &config.digest);
        let body = self.fetch(&mut token, reference, &url, &accept_config).await?;
        let image_config = ImageConfig::parse(&body)?;

        // Single-platform images are only usable if built for the target.
        if !from_index && !image_config.runs_on(&self.platform) {
            return Err(not_found());
        }

        let command = image_config.command();
        debug!(command = ?command.command, args = ?command.args, "resolved image command");
        Ok(ImageCommandEntry::single(&self.platform, command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(plain_http: &[&str]) -> RegistryResolver {
        let config = RegistryConfig {
            plain_http: plain_http.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        RegistryResolver::new(Platform::default(), config).unwrap()
    }

    #[test]
    fn urls_use_api_host_and_repository() {
        let r = resolver(&[]);
        let reference: ImageReference = "alpine:3.20".parse().unwrap();
        assert_eq!(
            r.url(&reference, "manifests", reference.manifest_ref()),
            "https://registry-1.docker.io/v2/library/alpine/manifests/3.20"
        );
        assert_eq!(
            r.url(&reference, "blobs", "sha256:abc"),
            "https://registry-1.docker.io/v2/library/alpine/blobs/sha256:abc"
        );
    }

    #[test]
    fn plain_http_registries_use_http() {
        let r = resolver(&["localhost:5000"]);
        let reference: ImageReference = "localhost:5000/tools/lint".parse().unwrap();
        assert_eq!(
            r.url(&reference, "manifests", reference.manifest_ref()),
            "http://localhost:5000/v2/tools/lint/manifests/latest"
        );
    }

    /// Resolver and reference pointing at a local mock registry.
    fn local(server: &mockito::Server) -> (RegistryResolver, ImageReference) {
        let host = server.host_with_port();
        let reference = format!("{host}/tools/app:v1").parse().unwrap();
        (resolver(&[host.as_str()]), reference)
    }

    const INDEX: &str = r#"{
        "schemaVersion": 2,
        "manifests": [
            {"mediaType": "application/vnd.oci.image.manifest.v1+json", "digest": "sha256:arm",
             "platform": {"architecture": "arm64", "os": "linux"}},
            {"mediaType": "application/vnd.oci.image.manifest.v1+json", "digest": "sha256:amd",
             "platform": {"architecture": "amd64", "os": "linux"}}
        ]
    }"#;

    const IMAGE_MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": "sha256:cfg"}
    }"#;

    #[tokio::test]
    async fn index_is_followed_to_config_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let (r, reference) = local(&server);
        let challenge = format!(
            r#"Bearer realm="{}/token",service="local",scope="repository:tools/app:pull""#,
            server.url()
        );

        let unauthorized = server
            .mock("GET", "/v2/tools/app/manifests/v1")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(401)
            .with_header("www-authenticate", &challenge)
            .expect(1)
            .create_async()
            .await;
        let token = server
            .mock("GET", mockito::Matcher::Regex(r"^/token(\?.*)?$".into()))
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("scope".into(), "repository:tools/app:pull".into()),
                mockito::Matcher::UrlEncoded("service".into(), "local".into()),
            ]))
            .with_body(r#"{"token": "t0k"}"#)
            .expect(1)
            .create_async()
            .await;
        let index = server
            .mock("GET", "/v2/tools/app/manifests/v1")
            .match_header("authorization", "Bearer t0k")
            .with_body(INDEX)
            .create_async()
            .await;
        let manifest = server
            .mock("GET", "/v2/tools/app/manifests/sha256:amd")
            .match_header("authorization", "Bearer t0k")
            .with_body(IMAGE_MANIFEST)
            .create_async()
            .await;
        let config = server
            .mock("GET", "/v2/tools/app/blobs/sha256:cfg")
            .match_header("authorization", "Bearer t0k")
            .with_body(r#"{"config": {"Entrypoint": ["/e"], "Cmd": ["x"]}}"#)
            .create_async()
            .await;

        let entry = r.resolve(&reference).await.unwrap();
        let command = entry.for_platform(&Platform::default()).unwrap();
        assert_eq!(command.command, vec!["/e"]);
        assert_eq!(command.args, vec!["x"]);

        for mock in [unauthorized, token, index, manifest, config] {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn single_platform_image_for_other_arch_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let (r, reference) = local(&server);
        server
            .mock("GET", "/v2/tools/app/manifests/v1")
            .with_body(IMAGE_MANIFEST)
            .create_async()
            .await;
        server
            .mock("GET", "/v2/tools/app/blobs/sha256:cfg")
            .with_body(r#"{"os": "linux", "architecture": "arm64", "config": {"Cmd": ["/bin/sh"]}}"#)
            .create_async()
            .await;

        let err = r.resolve(&reference).await.unwrap_err();
        assert!(matches!(err, ImageError::PlatformNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_url() {
        let mut server = mockito::Server::new_async().await;
        let (r, reference) = local(&server);
        server
            .mock("GET", "/v2/tools/app/manifests/v1")
            .with_status(404)
            .create_async()
            .await;

        let err = r.resolve(&reference).await.unwrap_err();
        match err {
            ImageError::Registry { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/v2/tools/app/manifests/v1"), "{url}");
            }
            other => panic!("expected registry error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_registry_is_a_transport_error() {
        let r = resolver(&["127.0.0.1:9"]);
        let reference: ImageReference = "127.0.0.1:9/nothing/here:v1".parse().unwrap();

        let err = r.resolve(&reference).await.unwrap_err();
        assert!(matches!(err, ImageError::Http(_)), "got {err:?}");
    }
}
