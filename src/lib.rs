pub mod backup;
pub mod config;
pub mod event;
pub mod ipam;
pub mod notify;
pub mod object;
pub mod overlap;
pub mod prefix;
pub mod registry;
pub mod sync;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use backup::{BackupError, BackupStore, DisabledBackupStore, FsBackupStore};
pub use config::{ConfigError, Environment, SandboxOverrides, SyncConfig};
pub use event::{EventError, PrefixEvent, WebhookEvent};
pub use ipam::{IpamClient, IpamError, InventoryIpam};
pub use notify::{Notification, Notifier, NotifyError, TracingNotifier};
pub use object::{format_attributes, line_diff, MergeEngine, ObjectType, RegistryObject};
pub use overlap::{OverlapError, OverlapResolver};
pub use prefix::{AddressRange, Eligibility, IpVersion, PrefixError, PrefixValidator};
pub use registry::{
    classify, Classified, HttpRegistry, RawResponse, RegistryError, RegistryTransport,
    RequestMethod, WhoisResponse,
};
pub use sync::{
    Collaborators, Reconciler, ReconciliationContext, SkipReason, SyncAction, SyncError,
    SyncOutcome, SyncReport,
};
pub use template::{
    Attribute, AttributeList, FsTemplateStore, ResolvedTemplate, TemplateError, TemplateResolver,
    TemplateStore,
};
