/// Protocol versions a profile can ask for as its floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

impl TlsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tls1_0 => "TLSv1",
            Self::Tls1_1 => "TLSv1.1",
            Self::Tls1_2 => "TLSv1.2",
            Self::Tls1_3 => "TLSv1.3",
        }
    }
}

/// Static description of a client hello to imitate.
///
/// Suite and algorithm names use the OpenSSL spelling so the lists can be
/// compared against captures of the official client. Every list is ordered:
/// servers may pick the first mutually supported entry.
#[derive(Debug, PartialEq, Eq)]
pub struct FingerprintProfile {
    pub min_version: TlsVersion,
    pub tls13_ciphers: &'static [&'static str],
    pub legacy_ciphers: &'static [&'static str],
    pub signature_algorithms: &'static [&'static str],
    pub alpn_protocol: &'static str,
}

/// Handshake profile of the official Riot client
pub static RIOT_CLIENT_PROFILE: FingerprintProfile = FingerprintProfile {
    min_version: TlsVersion::Tls1_0,
    tls13_ciphers: &[
        "TLS_CHACHA20_POLY1305_SHA256",
        "TLS_AES_128_GCM_SHA256",
        "TLS_AES_256_GCM_SHA384",
    ],
    legacy_ciphers: &[
        "ECDHE-ECDSA-CHACHA20-POLY1305",
        "ECDHE-RSA-CHACHA20-POLY1305",
        "ECDHE-ECDSA-AES128-GCM-SHA256",
        "ECDHE-RSA-AES128-GCM-SHA256",
        "ECDHE-ECDSA-AES256-GCM-SHA384",
        "ECDHE-RSA-AES256-GCM-SHA384",
        "ECDHE-ECDSA-AES128-SHA",
        "ECDHE-RSA-AES128-SHA",
        "ECDHE-ECDSA-AES256-SHA",
        "ECDHE-RSA-AES256-SHA",
        "AES128-GCM-SHA256",
        "AES256-GCM-SHA384",
        "AES128-SHA",
        "AES256-SHA",
        "DES-CBC3-SHA",
    ],
    signature_algorithms: &[
        "ecdsa_secp256r1_sha256",
        "rsa_pss_rsae_sha256",
        "rsa_pkcs1_sha256",
        "ecdsa_secp384r1_sha384",
        "rsa_pss_rsae_sha384",
        "rsa_pkcs1_sha384",
        "rsa_pss_rsae_sha512",
        "rsa_pkcs1_sha512",
        "rsa_pkcs1_sha1",
    ],
    alpn_protocol: "http/1.1",
};

impl FingerprintProfile {
    /// Colon-joined cipher string, as OpenSSL's `SSL_CTX_set_cipher_list` takes it
    pub fn legacy_cipher_string(&self) -> String {
        self.legacy_ciphers.join(":")
    }

    pub fn tls13_cipher_string(&self) -> String {
        self.tls13_ciphers.join(":")
    }

    pub fn signature_algorithm_string(&self) -> String {
        self.signature_algorithms.join(":")
    }
}
