use crate::config::Environment;
use crate::object::ObjectType;
use crate::prefix::AddressRange;

/// Everything known about one request while it is being reconciled.
///
/// Created per event and dropped at the end of the request. The merge engine
/// may replace `org` and `status`; overlap resolution temporarily swaps `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationContext {
    pub range: AddressRange,
    pub object_type: ObjectType,
    pub status: String,
    pub username: String,
    pub org: Option<String>,
    /// Template name, also used as netname
    pub template: Option<String>,
    pub country: Option<String>,
    pub environment: Environment,
}

impl ReconciliationContext {
    pub fn new(
        range: AddressRange,
        username: impl Into<String>,
        org: Option<String>,
        template: Option<String>,
        country: Option<String>,
        environment: Environment,
    ) -> Self {
        let object_type = ObjectType::for_range(&range);
        Self {
            range,
            object_type,
            status: object_type.default_status().to_string(),
            username: username.into(),
            org,
            template,
            country,
            environment,
        }
    }

    /// Point the context at another range, returning the previous one
    pub fn swap_range(&mut self, range: AddressRange) -> AddressRange {
        self.object_type = ObjectType::for_range(&range);
        std::mem::replace(&mut self.range, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_type_and_status() {
        let ctx = ReconciliationContext::new(
            AddressRange::parse("192.0.2.0/24").unwrap(),
            "jdoe",
            None,
            None,
            None,
            Environment::Production,
        );
        assert_eq!(ctx.object_type, ObjectType::Inetnum);
        assert_eq!(ctx.status, "ASSIGNED PA");
    }

    #[test]
    fn test_swap_range_returns_previous() {
        let original = AddressRange::parse("2001:db8:1::/48").unwrap();
        let candidate = AddressRange::parse("2001:db8::/32").unwrap();
        let mut ctx = ReconciliationContext::new(original, "jdoe", None, None, None, Environment::Sandbox);

        assert_eq!(ctx.swap_range(candidate), original);
        assert_eq!(ctx.range, candidate);
        assert_eq!(ctx.swap_range(original), candidate);
        assert_eq!(ctx.range, original);
    }
}
