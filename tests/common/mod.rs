#![allow(dead_code)]

use async_trait::async_trait;
use ripe_sync::object::ObjectType;
use ripe_sync::{
    AddressRange, BackupError, BackupStore, Collaborators, FsTemplateStore, IpamClient, IpamError,
    Notification, Notifier, NotifyError, RawResponse, Reconciler, RegistryError, RegistryObject,
    RegistryTransport, RequestMethod, SyncConfig, WhoisResponse,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::fs;

pub const TEMPLATES_JSON: &str = r#"{
    "templates": {
        "CLOUD-POOL": {
            "inherit": "master_inet6num.json",
            "attributes": [
                {"descr": "MyCompany Cloud Pool"},
                {"org": ""},
                {"mnt-by": ""},
                {"admin-c": ""},
                {"notify": ""},
                {"status": ""}
            ]
        },
        "OFFICE-LAN": {
            "inherit": "master_inetnum.json",
            "attributes": [
                {"descr": "Office network"},
                {"country": "NL"}
            ]
        }
    }
}"#;

pub const MASTER_INET6NUM_JSON: &str = r#"{
    "attributes": [
        {"inet6num": ""},
        {"netname": ""},
        {"descr": ""},
        {"org": "ORG-EXAMPLE1-RIPE"},
        {"country": ""},
        {"remarks": "Managed by ripeupdater"},
        {"admin-c": "EX1-RIPE"},
        {"tech-c": "EX1-RIPE"},
        {"notify": "noc@example.com"},
        {"mnt-by": "EXAMPLE-MNT"},
        {"status": "ASSIGNED"},
        {"source": "RIPE"}
    ]
}"#;

pub const MASTER_INETNUM_JSON: &str = r#"{
    "attributes": [
        {"inetnum": ""},
        {"netname": ""},
        {"descr": ""},
        {"org": "ORG-EXAMPLE1-RIPE"},
        {"country": ""},
        {"admin-c": "EX1-RIPE"},
        {"tech-c": "EX1-RIPE"},
        {"mnt-by": "EXAMPLE-MNT"},
        {"status": "ASSIGNED PA"},
        {"source": "RIPE"}
    ]
}"#;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write the template fixtures into `dir`
pub async fn write_templates(dir: &Path) {
    fs::write(dir.join("templates.json"), TEMPLATES_JSON)
        .await
        .expect("Should write templates.json");
    fs::write(dir.join("master_inet6num.json"), MASTER_INET6NUM_JSON)
        .await
        .expect("Should write master_inet6num.json");
    fs::write(dir.join("master_inetnum.json"), MASTER_INETNUM_JSON)
        .await
        .expect("Should write master_inetnum.json");
}

/// Sandbox configuration pointing at `dir`
pub fn sandbox_config(dir: &Path) -> SyncConfig {
    SyncConfig {
        templates_dir: dir.to_path_buf(),
        default_country: Some("DE".to_string()),
        ..SyncConfig::default()
    }
}

pub fn range(s: &str) -> AddressRange {
    AddressRange::parse(s).expect("Should parse range")
}

/// Registry body carrying one object
pub fn object_body(object: &RegistryObject) -> String {
    serde_json::to_string(&WhoisResponse::from_object(object)).expect("Should serialize object")
}

/// Registry body with error messages only
pub fn error_body(texts: &[&str]) -> String {
    let messages: Vec<_> = texts
        .iter()
        .map(|t| serde_json::json!({"severity": "Error", "text": t}))
        .collect();
    serde_json::json!({"errormessages": {"errormessage": messages}}).to_string()
}

/// Search result naming `key` as primary key
pub fn search_body(object_type: ObjectType, key: &str) -> String {
    serde_json::json!({
        "objects": {"object": [{
            "type": object_type.as_str(),
            "primary-key": {"attribute": [{"name": object_type.as_str(), "value": key}]},
            "attributes": {"attribute": [{"name": object_type.as_str(), "value": key}]}
        }]}
    })
    .to_string()
}

/// One request seen by the fake registry
#[derive(Debug, Clone)]
pub struct Call {
    pub method: RequestMethod,
    pub object_type: ObjectType,
    /// Object key, search query, or empty for creates
    pub key: String,
    pub document: Option<WhoisResponse>,
    pub search: bool,
}

/// Registry transport answering from scripted queues.
///
/// Unscripted fetches, deletes and searches answer 404; unscripted creates
/// and updates echo the submitted document.
#[derive(Default)]
pub struct FakeRegistry {
    pub calls: Mutex<Vec<Call>>,
    fetches: Mutex<VecDeque<RawResponse>>,
    creates: Mutex<VecDeque<RawResponse>>,
    updates: Mutex<VecDeque<RawResponse>>,
    deletes: Mutex<VecDeque<RawResponse>>,
    searches: Mutex<VecDeque<RawResponse>>,
}

impl FakeRegistry {
    pub fn on_fetch(&self, status: u16, body: impl Into<String>) -> &Self {
        self.fetches
            .lock()
            .unwrap()
            .push_back(RawResponse::new(RequestMethod::Get, status, body));
        self
    }

    pub fn on_create(&self, status: u16, body: impl Into<String>) -> &Self {
        self.creates
            .lock()
            .unwrap()
            .push_back(RawResponse::new(RequestMethod::Post, status, body));
        self
    }

    pub fn on_update(&self, status: u16, body: impl Into<String>) -> &Self {
        self.updates
            .lock()
            .unwrap()
            .push_back(RawResponse::new(RequestMethod::Put, status, body));
        self
    }

    pub fn on_delete(&self, status: u16, body: impl Into<String>) -> &Self {
        self.deletes
            .lock()
            .unwrap()
            .push_back(RawResponse::new(RequestMethod::Delete, status, body));
        self
    }

    pub fn on_search(&self, status: u16, body: impl Into<String>) -> &Self {
        self.searches
            .lock()
            .unwrap()
            .push_back(RawResponse::new(RequestMethod::Get, status, body));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Methods of the mutating calls, in order
    pub fn mutations(&self) -> Vec<(RequestMethod, String)> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != RequestMethod::Get)
            .map(|c| (c.method, c.key))
            .collect()
    }

    fn record(
        &self,
        method: RequestMethod,
        object_type: ObjectType,
        key: &str,
        document: Option<&WhoisResponse>,
        search: bool,
    ) {
        self.calls.lock().unwrap().push(Call {
            method,
            object_type,
            key: key.to_string(),
            document: document.cloned(),
            search,
        });
    }

    fn next(
        queue: &Mutex<VecDeque<RawResponse>>,
        fallback: impl FnOnce() -> RawResponse,
    ) -> RawResponse {
        queue.lock().unwrap().pop_front().unwrap_or_else(fallback)
    }
}

fn echo(method: RequestMethod, status: u16, document: &WhoisResponse) -> RawResponse {
    RawResponse::new(
        method,
        status,
        serde_json::to_string(document).expect("Should serialize document"),
    )
}

#[async_trait]
impl RegistryTransport for FakeRegistry {
    async fn fetch(
        &self,
        object_type: ObjectType,
        key: &str,
    ) -> Result<RawResponse, RegistryError> {
        self.record(RequestMethod::Get, object_type, key, None, false);
        Ok(Self::next(&self.fetches, || {
            RawResponse::new(RequestMethod::Get, 404, "")
        }))
    }

    async fn create(
        &self,
        object_type: ObjectType,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError> {
        self.record(RequestMethod::Post, object_type, "", Some(document), false);
        Ok(Self::next(&self.creates, || {
            echo(RequestMethod::Post, 201, document)
        }))
    }

    async fn update(
        &self,
        object_type: ObjectType,
        key: &str,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError> {
        self.record(RequestMethod::Put, object_type, key, Some(document), false);
        Ok(Self::next(&self.updates, || {
            echo(RequestMethod::Put, 200, document)
        }))
    }

    async fn delete(
        &self,
        object_type: ObjectType,
        key: &str,
    ) -> Result<RawResponse, RegistryError> {
        self.record(RequestMethod::Delete, object_type, key, None, false);
        Ok(Self::next(&self.deletes, || {
            RawResponse::new(RequestMethod::Delete, 404, "")
        }))
    }

    async fn search(
        &self,
        object_type: ObjectType,
        query: &str,
    ) -> Result<RawResponse, RegistryError> {
        self.record(RequestMethod::Get, object_type, query, None, true);
        Ok(Self::next(&self.searches, || {
            RawResponse::new(RequestMethod::Get, 404, "")
        }))
    }
}

/// IPAM answering from fixed values
#[derive(Default)]
pub struct FakeIpam {
    pub org: Option<String>,
    pub countries: HashMap<String, String>,
    pub known: Vec<AddressRange>,
}

#[async_trait]
impl IpamClient for FakeIpam {
    async fn lookup_org(&self, _range: &AddressRange) -> Result<Option<String>, IpamError> {
        Ok(self.org.clone())
    }

    async fn lookup_country(&self, site: &str) -> Result<Option<String>, IpamError> {
        Ok(self.countries.get(site).cloned())
    }

    async fn is_known_prefix_or_aggregate(
        &self,
        range: &AddressRange,
    ) -> Result<bool, IpamError> {
        Ok(self.known.contains(range))
    }
}

#[derive(Default)]
pub struct MemoryBackup {
    pub entries: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Reject every put, like a full disk
    pub failing: bool,
}

#[async_trait]
impl BackupStore for MemoryBackup {
    async fn put(&self, key: &str, content: &[u8]) -> Result<(), BackupError> {
        if self.failing {
            return Err(BackupError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "No space left on device",
            )));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), content.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BackupError> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| BackupError::NotFound(key.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, BackupError> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub unreachable: bool,
    /// Reachable, but every send is refused
    pub refusing: bool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.unreachable {
            return Err(NotifyError::Unreachable("smtp.invalid:25".to_string()));
        }
        if self.refusing {
            return Err(NotifyError::SendFailed("550 mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// A reconciler wired to fakes, with handles to inspect them
pub struct Harness {
    pub dir: TempDir,
    pub registry: Arc<FakeRegistry>,
    pub backup: Arc<MemoryBackup>,
    pub notifier: Arc<RecordingNotifier>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub async fn new(ipam: FakeIpam) -> Self {
        Self::with_notifier(ipam, RecordingNotifier::default()).await
    }

    pub async fn with_notifier(ipam: FakeIpam, notifier: RecordingNotifier) -> Self {
        Self::with_parts(ipam, MemoryBackup::default(), notifier).await
    }

    pub async fn with_parts(
        ipam: FakeIpam,
        backup: MemoryBackup,
        notifier: RecordingNotifier,
    ) -> Self {
        let dir = create_test_dir();
        write_templates(dir.path()).await;

        let registry = Arc::new(FakeRegistry::default());
        let backup = Arc::new(backup);
        let notifier = Arc::new(notifier);

        let collaborators = Collaborators {
            transport: registry.clone(),
            ipam: Arc::new(ipam),
            backup: backup.clone(),
            notifier: notifier.clone(),
            templates: Arc::new(FsTemplateStore::new(dir.path())),
        };
        let reconciler = Reconciler::new(sandbox_config(dir.path()), collaborators);

        Self {
            dir,
            registry,
            backup,
            notifier,
            reconciler,
        }
    }
}
