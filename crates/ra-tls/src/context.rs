use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CipherSuite, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
    SupportedCipherSuite, SupportedProtocolVersion,
};
use tracing::{debug, instrument, warn};

use crate::errors::{Result, TlsError};
use crate::profile::{FingerprintProfile, TlsVersion};

/// Which part of the profile could not be reproduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    ProtocolVersion,
    Tls13Cipher,
    LegacyCipher,
    SignatureAlgorithm,
}

/// A profile entry that the rustls backend cannot put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintGap {
    pub kind: GapKind,
    pub entry: &'static str,
}

/// Client TLS configuration built from a [`FingerprintProfile`].
///
/// Immutable once built. Share it behind an `Arc` between every session that
/// should present the same handshake.
#[derive(Debug, Clone)]
pub struct TlsContext {
    profile: &'static FingerprintProfile,
    config: Arc<ClientConfig>,
    signature_schemes: Vec<SignatureScheme>,
    gaps: Vec<FingerprintGap>,
}

impl TlsContext {
    pub fn profile(&self) -> &'static FingerprintProfile {
        self.profile
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// Owned copy of the config, for HTTP clients that take it by value
    pub fn client_config(&self) -> ClientConfig {
        (*self.config).clone()
    }

    /// Cipher suites in the order they appear in the client hello
    pub fn offered_cipher_suites(&self) -> Vec<CipherSuite> {
        self.config
            .crypto_provider()
            .cipher_suites
            .iter()
            .map(|suite| suite.suite())
            .collect()
    }

    /// Signature schemes in the order they appear in the client hello
    pub fn offered_signature_schemes(&self) -> &[SignatureScheme] {
        &self.signature_schemes
    }

    pub fn alpn_protocols(&self) -> &[Vec<u8>] {
        &self.config.alpn_protocols
    }

    /// Profile entries that could not be applied
    pub fn gaps(&self) -> &[FingerprintGap] {
        &self.gaps
    }
}

/// Build a TLS context that reproduces `profile` as closely as rustls allows.
///
/// The order of application is: protocol floor, ALPN, TLS 1.3 suites, legacy
/// suites, signature algorithms. Entries rustls has no implementation for are
/// reported through [`TlsContext::gaps`] instead of being replaced.
#[instrument(skip(profile), fields(alpn = profile.alpn_protocol))]
pub fn build_tls_context(profile: &'static FingerprintProfile) -> Result<TlsContext> {
    let mut gaps = Vec::new();

    let versions = protocol_versions(profile.min_version);
    if profile.min_version < TlsVersion::Tls1_2 {
        gaps.push(FingerprintGap {
            kind: GapKind::ProtocolVersion,
            entry: profile.min_version.as_str(),
        });
    }

    let mut cipher_suites = Vec::new();
    for &name in profile.tls13_ciphers {
        match tls13_suite(name) {
            Some(suite) => cipher_suites.push(suite),
            None => gaps.push(FingerprintGap {
                kind: GapKind::Tls13Cipher,
                entry: name,
            }),
        }
    }
    if cipher_suites.is_empty() {
        return Err(TlsError::PlatformUnsupported(
            "none of the TLS 1.3 cipher suites are available".to_string(),
        ));
    }

    for &name in profile.legacy_ciphers {
        match legacy_suite(name) {
            Some(suite) => cipher_suites.push(suite),
            None => gaps.push(FingerprintGap {
                kind: GapKind::LegacyCipher,
                entry: name,
            }),
        }
    }

    let provider = Arc::new(CryptoProvider {
        cipher_suites,
        ..ring::default_provider()
    });

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
        .build()
        .map_err(|e| TlsError::Verifier(e.to_string()))?;

    let verifiable = webpki.supported_verify_schemes();
    let mut signature_schemes = Vec::new();
    for &name in profile.signature_algorithms {
        match signature_scheme(name) {
            Some(scheme) if verifiable.contains(&scheme) => signature_schemes.push(scheme),
            _ => gaps.push(FingerprintGap {
                kind: GapKind::SignatureAlgorithm,
                entry: name,
            }),
        }
    }
    if signature_schemes.is_empty() {
        return Err(TlsError::PlatformUnsupported(
            "none of the signature algorithms can be verified".to_string(),
        ));
    }

    let verifier = OrderedSchemesVerifier {
        inner: webpki,
        schemes: signature_schemes.clone(),
    };

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&versions)
        .map_err(|e| TlsError::PlatformUnsupported(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![profile.alpn_protocol.as_bytes().to_vec()];

    for gap in &gaps {
        warn!(kind = ?gap.kind, entry = gap.entry, "Fingerprint entry not reproducible with rustls");
    }
    debug!(
        suites = config.crypto_provider().cipher_suites.len(),
        schemes = signature_schemes.len(),
        gaps = gaps.len(),
        "Built fingerprinted TLS context"
    );

    Ok(TlsContext {
        profile,
        config: Arc::new(config),
        signature_schemes,
        gaps,
    })
}

fn protocol_versions(min: TlsVersion) -> Vec<&'static SupportedProtocolVersion> {
    [
        (TlsVersion::Tls1_2, &rustls::version::TLS12),
        (TlsVersion::Tls1_3, &rustls::version::TLS13),
    ]
    .into_iter()
    .filter(|(version, _)| *version >= min)
    .map(|(_, supported)| supported)
    .collect()
}

fn tls13_suite(name: &str) -> Option<SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite::*;

    match name {
        "TLS_CHACHA20_POLY1305_SHA256" => Some(TLS13_CHACHA20_POLY1305_SHA256),
        "TLS_AES_128_GCM_SHA256" => Some(TLS13_AES_128_GCM_SHA256),
        "TLS_AES_256_GCM_SHA384" => Some(TLS13_AES_256_GCM_SHA384),
        _ => None,
    }
}

// rustls ships no CBC, static-RSA or 3DES suites
fn legacy_suite(name: &str) -> Option<SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite::*;

    match name {
        "ECDHE-ECDSA-CHACHA20-POLY1305" => Some(TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256),
        "ECDHE-RSA-CHACHA20-POLY1305" => Some(TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256),
        "ECDHE-ECDSA-AES128-GCM-SHA256" => Some(TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256),
        "ECDHE-RSA-AES128-GCM-SHA256" => Some(TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256),
        "ECDHE-ECDSA-AES256-GCM-SHA384" => Some(TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384),
        "ECDHE-RSA-AES256-GCM-SHA384" => Some(TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384),
        _ => None,
    }
}

fn signature_scheme(name: &str) -> Option<SignatureScheme> {
    match name {
        "ecdsa_secp256r1_sha256" => Some(SignatureScheme::ECDSA_NISTP256_SHA256),
        "ecdsa_secp384r1_sha384" => Some(SignatureScheme::ECDSA_NISTP384_SHA384),
        "ecdsa_secp521r1_sha512" => Some(SignatureScheme::ECDSA_NISTP521_SHA512),
        "rsa_pss_rsae_sha256" => Some(SignatureScheme::RSA_PSS_SHA256),
        "rsa_pss_rsae_sha384" => Some(SignatureScheme::RSA_PSS_SHA384),
        "rsa_pss_rsae_sha512" => Some(SignatureScheme::RSA_PSS_SHA512),
        "rsa_pkcs1_sha256" => Some(SignatureScheme::RSA_PKCS1_SHA256),
        "rsa_pkcs1_sha384" => Some(SignatureScheme::RSA_PKCS1_SHA384),
        "rsa_pkcs1_sha512" => Some(SignatureScheme::RSA_PKCS1_SHA512),
        "rsa_pkcs1_sha1" => Some(SignatureScheme::RSA_PKCS1_SHA1),
        "ed25519" => Some(SignatureScheme::ED25519),
        _ => None,
    }
}

/// WebPKI verification with the profile's signature scheme order.
///
/// rustls fills the `signature_algorithms` extension from
/// `supported_verify_schemes`, so this is the only place the order is set.
#[derive(Debug)]
struct OrderedSchemesVerifier {
    inner: Arc<WebPkiServerVerifier>,
    schemes: Vec<SignatureScheme>,
}

impl ServerCertVerifier for OrderedSchemesVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RIOT_CLIENT_PROFILE;

    const EXPECTED_SUITES: &[u16] = &[
        0x1303, 0x1301, 0x1302, 0xcca9, 0xcca8, 0xc02b, 0xc02f, 0xc02c, 0xc030,
    ];
    const EXPECTED_SCHEMES: &[u16] = &[
        0x0403, 0x0804, 0x0401, 0x0503, 0x0805, 0x0501, 0x0806, 0x0601,
    ];
    const RENEGOTIATION_INFO_SCSV: u16 = 0x00ff;

    struct ClientHello {
        cipher_suites: Vec<u16>,
        signature_schemes: Vec<u16>,
        alpn: Vec<Vec<u8>>,
    }

    fn read_u16(buf: &[u8], pos: usize) -> usize {
        u16::from_be_bytes([buf[pos], buf[pos + 1]]) as usize
    }

    fn client_hello(ctx: &TlsContext) -> ClientHello {
        let server_name = ServerName::try_from("auth.riotgames.com").unwrap();
        let mut conn = rustls::ClientConnection::new(ctx.config(), server_name).unwrap();
        let mut record = Vec::new();
        conn.write_tls(&mut record).unwrap();

        assert_eq!(record[0], 0x16, "handshake record");
        let body = &record[5..];
        assert_eq!(body[0], 0x01, "client hello");

        // handshake header, legacy version, random
        let mut pos = 4 + 2 + 32;
        pos += 1 + body[pos] as usize;

        let suites_len = read_u16(body, pos);
        pos += 2;
        let cipher_suites = (0..suites_len / 2)
            .map(|i| read_u16(body, pos + 2 * i) as u16)
            .collect();
        pos += suites_len;
        pos += 1 + body[pos] as usize;

        let extensions_end = pos + 2 + read_u16(body, pos);
        pos += 2;
        let mut signature_schemes = Vec::new();
        let mut alpn = Vec::new();
        while pos < extensions_end {
            let kind = read_u16(body, pos);
            let len = read_u16(body, pos + 2);
            let data = &body[pos + 4..pos + 4 + len];
            match kind {
                0x000d => {
                    let list_len = read_u16(data, 0);
                    signature_schemes = (0..list_len / 2)
                        .map(|i| read_u16(data, 2 + 2 * i) as u16)
                        .collect();
                }
                0x0010 => {
                    let list_end = 2 + read_u16(data, 0);
                    let mut p = 2;
                    while p < list_end {
                        let n = data[p] as usize;
                        alpn.push(data[p + 1..p + 1 + n].to_vec());
                        p += 1 + n;
                    }
                }
                _ => {}
            }
            pos += 4 + len;
        }

        ClientHello {
            cipher_suites,
            signature_schemes,
            alpn,
        }
    }

    #[test]
    fn test_client_hello_matches_reference() {
        let ctx = build_tls_context(&RIOT_CLIENT_PROFILE).unwrap();
        let hello = client_hello(&ctx);

        let suites: Vec<u16> = hello
            .cipher_suites
            .into_iter()
            .filter(|s| *s != RENEGOTIATION_INFO_SCSV)
            .collect();
        assert_eq!(suites, EXPECTED_SUITES);
        assert_eq!(hello.signature_schemes, EXPECTED_SCHEMES);
        assert_eq!(hello.alpn, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn test_offered_lists_follow_profile_order() {
        let ctx = build_tls_context(&RIOT_CLIENT_PROFILE).unwrap();

        let suites: Vec<u16> = ctx
            .offered_cipher_suites()
            .into_iter()
            .map(u16::from)
            .collect();
        assert_eq!(suites, EXPECTED_SUITES);

        let schemes: Vec<u16> = ctx
            .offered_signature_schemes()
            .iter()
            .map(|s| u16::from(*s))
            .collect();
        assert_eq!(schemes, EXPECTED_SCHEMES);
        assert_eq!(ctx.alpn_protocols(), &[b"http/1.1".to_vec()]);
    }

    #[test]
    fn test_gaps_are_reported() {
        let ctx = build_tls_context(&RIOT_CLIENT_PROFILE).unwrap();
        let gaps = ctx.gaps();

        assert!(gaps.contains(&FingerprintGap {
            kind: GapKind::ProtocolVersion,
            entry: "TLSv1",
        }));
        assert!(gaps.contains(&FingerprintGap {
            kind: GapKind::LegacyCipher,
            entry: "DES-CBC3-SHA",
        }));
        assert!(gaps.contains(&FingerprintGap {
            kind: GapKind::SignatureAlgorithm,
            entry: "rsa_pkcs1_sha1",
        }));
        assert_eq!(
            gaps.iter()
                .filter(|g| g.kind == GapKind::LegacyCipher)
                .count(),
            9
        );
        assert!(!gaps.iter().any(|g| g.kind == GapKind::Tls13Cipher));
    }

    #[test]
    fn test_profile_untouched_by_contexts() {
        let first = build_tls_context(&RIOT_CLIENT_PROFILE).unwrap();
        let second = build_tls_context(&RIOT_CLIENT_PROFILE).unwrap();

        assert!(std::ptr::eq(first.profile(), &RIOT_CLIENT_PROFILE));
        assert!(std::ptr::eq(first.profile(), second.profile()));
        assert_eq!(first.offered_cipher_suites(), second.offered_cipher_suites());
        assert_eq!(
            first.offered_signature_schemes(),
            second.offered_signature_schemes()
        );

        let shared = Arc::new(first);
        let _a = shared.client_config();
        let _b = shared.client_config();
        assert_eq!(shared.offered_signature_schemes().len(), EXPECTED_SCHEMES.len());
        assert_eq!(RIOT_CLIENT_PROFILE.tls13_ciphers.len(), 3);
        assert_eq!(RIOT_CLIENT_PROFILE.legacy_ciphers.len(), 15);
        assert_eq!(RIOT_CLIENT_PROFILE.signature_algorithms.len(), 9);
    }

    static NO_TLS13: FingerprintProfile = FingerprintProfile {
        min_version: TlsVersion::Tls1_2,
        tls13_ciphers: &["TLS_AES_128_CCM_SHA256"],
        legacy_ciphers: &["ECDHE-RSA-AES128-GCM-SHA256"],
        signature_algorithms: &["rsa_pkcs1_sha256"],
        alpn_protocol: "http/1.1",
    };

    static NO_SIGALGS: FingerprintProfile = FingerprintProfile {
        min_version: TlsVersion::Tls1_2,
        tls13_ciphers: &["TLS_AES_128_GCM_SHA256"],
        legacy_ciphers: &[],
        signature_algorithms: &["rsa_pkcs1_sha1"],
        alpn_protocol: "http/1.1",
    };

    #[test]
    fn test_unreproducible_profile_is_rejected() {
        assert!(matches!(
            build_tls_context(&NO_TLS13),
            Err(TlsError::PlatformUnsupported(_))
        ));
        assert!(matches!(
            build_tls_context(&NO_SIGALGS),
            Err(TlsError::PlatformUnsupported(_))
        ));
    }
}
