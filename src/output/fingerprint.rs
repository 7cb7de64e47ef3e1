//! Named server fingerprints
//!
//! Each fingerprint is a regular expression over captured header values
//! that identifies a server, framework or platform. `gov` is the one entry
//! that matches names instead of headers.

use crate::storage::DomainFilter;

/// What a fingerprint matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintTarget {
    /// Any captured header value
    HeaderValue,
    /// The domain name
    Name,
}

/// A browsable fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// Short identifier used on the command line
    pub slug: &'static str,
    /// Listing heading
    pub title: &'static str,
    pub pattern: &'static str,
    pub target: FingerprintTarget,
}

impl Fingerprint {
    const fn header(slug: &'static str, title: &'static str, pattern: &'static str) -> Self {
        Self {
            slug,
            title,
            pattern,
            target: FingerprintTarget::HeaderValue,
        }
    }

    /// Builds the store filter for this fingerprint
    pub fn filter(&self) -> DomainFilter {
        match self.target {
            FingerprintTarget::HeaderValue => DomainFilter::HeaderValueMatches(self.pattern.to_string()),
            FingerprintTarget::Name => DomainFilter::NameMatches(self.pattern.to_string()),
        }
    }
}

pub const FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint {
        slug: "gov",
        title: "Government Sites",
        pattern: ".gov",
        target: FingerprintTarget::Name,
    },
    Fingerprint::header("drupal", "Drupal Sites", "Drupal"),
    Fingerprint::header("django", "Django Sites", "^django_language"),
    Fingerprint::header("zope", "Zope Sites", "(?i)^Zope/"),
    Fingerprint::header("php", "PHP Sites", "^PHP/"),
    Fingerprint::header("java", "Java Sites", "^JSESSIONID="),
    Fingerprint::header("aspdotnet", "ASP.NET Sites", "^ASP.NET_SessionId="),
    Fingerprint::header("python", "Python Sites", "Python/"),
    Fingerprint::header("ruby", "Ruby Sites", "Ruby/"),
    Fingerprint::header("apache", "Apache Sites", "^Apache"),
    Fingerprint::header("nginx", "Nginx Sites", "^nginx"),
    Fingerprint::header("iis", "IIS Sites", "^Microsoft-IIS"),
    Fingerprint::header("tomcat", "Tomcat Sites", "tomcat"),
    Fingerprint::header("webrick", "WEBrick Sites", "^WEBrick"),
    Fingerprint::header("lighttpd", "Lighttpd Sites", "^lighttpd"),
    Fingerprint::header("ibmhttpserver", "IBM HTTP Server", "^IBM_HTTP_Server"),
    Fingerprint::header("apusic", "Apusic Sites", "Apusic"),
    Fingerprint::header("enhydra", "Enhydra Sites", "Enhydra"),
    Fingerprint::header("jetty", "Jetty Sites", "Jetty"),
    Fingerprint::header("unix", "Unix Sites", "(Unix)"),
    Fingerprint::header("linux", "Linux Sites", "Linux"),
    Fingerprint::header("debian", "Debian Sites", "Debian"),
    Fingerprint::header("fedora", "Fedora Sites", "Fedora"),
    Fingerprint::header("redhat", "Red Hat Sites", "Red Hat"),
    Fingerprint::header("centos", "CentOS Sites", "CentOS"),
    Fingerprint::header("ubuntu", "Ubuntu Sites", "Ubuntu"),
    Fingerprint::header("freebsd", "FreeBSD Sites", "FreeBSD"),
    Fingerprint::header("win32", "Win32 Sites", "Win32"),
    Fingerprint::header("win64", "Win64 Sites", "Win64"),
    Fingerprint::header("darwin", "Darwin Sites", "Darwin"),
    Fingerprint::header("phusionpassenger", "Phusion Passenger Sites", "Phusion_Passenger"),
    Fingerprint::header("openssl", "OpenSSL Sites", "OpenSSL"),
    Fingerprint::header("webdav", "WebDAV Sites", "DAV"),
    Fingerprint::header("communique", "Communique Sites", "Communique"),
    Fingerprint::header("bigipserver", "BIGipServer Sites", "BIGipServer"),
];

/// Looks up a fingerprint by slug
pub fn find_fingerprint(slug: &str) -> Option<&'static Fingerprint> {
    FINGERPRINTS.iter().find(|f| f.slug.eq_ignore_ascii_case(slug))
}
