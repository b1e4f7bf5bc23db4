//! Backend connectivity probes for the `pensionweb-diagnose` binary

use std::time::Duration;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const USER_AGENT: &str = "Backend-Diagnostic-Tool";

pub const BANNER: &str = "🔍 Backend Diagnostic Tool\n==========================\n";

pub const SUMMARY: &str = "\
📋 Diagnostic Summary:
======================
If you see ❌ for all endpoints:
  → Your Spring Boot backend is not running
  → Start it with: mvn spring-boot:run or ./mvnw spring-boot:run

If you see ✅ for port 8080 but 404 for /api endpoints:
  → Backend is running but missing API endpoints
  → Check your Spring Boot controllers

If you see ✅ for different port:
  → Update PENSION_API_URL (or backend.base_url) with the correct port

Next steps:
1. Make sure Spring Boot is running
2. Check Spring Boot console for startup errors
3. Verify your controllers are properly annotated
4. Test endpoints manually with curl or Postman";

/// One host/port/path to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Probe {
    pub fn new(host: &str, port: u16, path: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// The fixed battery: the usual backend port and two alternatives
pub fn default_probes(host: &str) -> Vec<Probe> {
    [
        (8080, "/"),
        (8080, "/api"),
        (8080, "/api/pensioners"),
        (8080, "/api/affilies"),
        (8080, "/api/allocataires"),
        (8080, "/actuator/health"),
        (9090, "/"),
        (3000, "/"),
    ]
    .iter()
    .map(|(port, path)| Probe::new(host, *port, path))
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Responded { status: u16, body: String },
    Failed(String),
}

impl ProbeOutcome {
    /// Report line for this outcome
    pub fn describe(&self) -> String {
        match self {
            ProbeOutcome::Responded { status, body } => {
                let mut line = format!("✅ Status: {}", status);
                if *status == 200 && !body.is_empty() {
                    let preview: String = body.replace('\n', " ").chars().take(100).collect();
                    line.push_str(&format!("\n   Response preview: {}...", preview));
                }
                line
            }
            ProbeOutcome::Failed(error) => format!("❌ {}", error),
        }
    }
}

/// HTTP client configured for probing
pub fn probe_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

pub async fn run_probe(client: &reqwest::Client, probe: &Probe) -> ProbeOutcome {
    let url = probe.url();
    log::debug!("Probing {}", url);

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return ProbeOutcome::Failed("Request timeout".to_string()),
        Err(e) => return ProbeOutcome::Failed(e.to_string()),
    };

    let status = response.status().as_u16();
    match response.text().await {
        Ok(text) => ProbeOutcome::Responded {
            status,
            body: text.chars().take(200).collect(),
        },
        Err(e) if e.is_timeout() => ProbeOutcome::Failed("Request timeout".to_string()),
        Err(e) => ProbeOutcome::Failed(e.to_string()),
    }
}

// ==================== Tests ====================
