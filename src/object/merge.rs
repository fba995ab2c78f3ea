use crate::config::SandboxOverrides;
use crate::sync::ReconciliationContext;
use crate::template::{Attribute, AttributeList};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Position (0-based) where the first `descr` attribute is placed
pub const DESCR_POSITION: usize = 2;

/// Position (0-based) where the first `country` attribute is placed, shifted by
/// the number of `descr` attributes placed before it
pub const COUNTRY_POSITION: usize = 4;

const MAINTAINER_ATTRIBUTES: &[&str] = &[
    "mnt-by",
    "mnt-ref",
    "mnt-lower",
    "mnt-domains",
    "mnt-routes",
    "mnt-irt",
];

const CONTACT_ATTRIBUTES: &[&str] = &["admin-c", "tech-c", "abuse-c"];

/// Builds the ordered attribute list of a registry object from the computed
/// values of a request, a template and the template's master.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    sandbox: SandboxOverrides,
}

impl MergeEngine {
    pub fn new(sandbox: SandboxOverrides) -> Self {
        Self { sandbox }
    }

    /// Merge computed, template and master attributes into the final object.
    ///
    /// `org` values found in the template or master replace the context's
    /// organisation (master wins); in the sandbox the context's status is
    /// replaced by the sandbox status of the address family.
    pub fn merge(
        &self,
        ctx: &mut ReconciliationContext,
        template: &[Attribute],
        master: &[Attribute],
    ) -> AttributeList {
        let mut template_fields = Vec::new();
        let mut template_names = HashSet::new();

        for attribute in template.iter().filter(|a| !a.is_empty()) {
            template_names.insert(attribute.name.as_str());
            if attribute.name == "org" {
                ctx.org = Some(attribute.value.clone());
            } else {
                template_fields.push(attribute.clone());
            }
        }

        let mut master_fields = Vec::new();
        for attribute in master.iter().filter(|a| !a.is_empty()) {
            let name = attribute.name.as_str();
            if name == "org" {
                ctx.org = Some(attribute.value.clone());
                continue;
            }
            // template values win, except for the repeatable descr and country
            if template_names.contains(name) && name != "descr" && name != "country" {
                continue;
            }
            master_fields.push(attribute.clone());
        }

        let mut fields = vec![
            Attribute::new(ctx.object_type.as_str(), ctx.range.registry_key()),
            Attribute::new("netname", ctx.template.clone().unwrap_or_default()),
            Attribute::new("org", ctx.org.clone().unwrap_or_default()),
            Attribute::new("country", ctx.country.clone().unwrap_or_default()),
        ];
        fields.extend(template_fields);
        fields.extend(master_fields);

        if ctx.environment.is_sandbox() {
            self.apply_sandbox(ctx, &mut fields);
        }

        let ordered = self.order(ctx, fields);
        debug!(prefix = %ctx.range, attributes = ?ordered.names(), "Generated object");
        ordered
    }

    /// Replace values that only exist in the production database
    fn apply_sandbox(&self, ctx: &mut ReconciliationContext, fields: &mut [Attribute]) {
        let status = self.sandbox.status_for(ctx.range.version()).to_string();

        for field in fields.iter_mut() {
            let name = field.name.as_str();
            if name == "org" {
                field.value = self.sandbox.org.clone();
            } else if MAINTAINER_ATTRIBUTES.contains(&name) {
                field.value = self.sandbox.maintainer.clone();
            } else if CONTACT_ATTRIBUTES.contains(&name) {
                field.value = self.sandbox.contact.clone();
            } else if name == "source" {
                field.value = ctx.environment.id().to_string();
            } else if name == "status" {
                field.value = status.clone();
            }
        }

        ctx.status = status;
    }

    /// Place `descr`, `country` and `status` at their conventional positions
    /// and drop attributes without a value.
    fn order(&self, ctx: &ReconciliationContext, fields: Vec<Attribute>) -> AttributeList {
        let mut sorted: Vec<Attribute> = Vec::with_capacity(fields.len() + 1);
        let mut status: Option<Attribute> = None;
        let mut status_count = 0;
        let mut descr_count = 0;
        let mut country_count = 0;

        for field in fields {
            match field.name.as_str() {
                "descr" => {
                    let at = DESCR_POSITION + descr_count;
                    insert_clamped(&mut sorted, at, field);
                    descr_count += 1;
                }
                "country" => {
                    let at = COUNTRY_POSITION + descr_count + country_count;
                    insert_clamped(&mut sorted, at, field);
                    country_count += 1;
                }
                "status" => {
                    status_count += 1;
                    status = Some(field);
                }
                _ => sorted.push(field),
            }
        }

        if status_count > 1 {
            warn!(
                prefix = %ctx.range,
                count = status_count,
                "Template supplies several status attributes, keeping the last one; please review the template"
            );
        }

        let status = status.unwrap_or_else(|| Attribute::new("status", ctx.status.clone()));
        let at = sorted.len().saturating_sub(1);
        sorted.insert(at, status);

        sorted.into_iter().filter(|a| !a.is_empty()).collect()
    }
}

/// Insert at `at`, or append when the list is still shorter than that
fn insert_clamped(sorted: &mut Vec<Attribute>, at: usize, field: Attribute) {
    let at = at.min(sorted.len());
    sorted.insert(at, field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::prefix::AddressRange;

    fn context(prefix: &str, environment: Environment) -> ReconciliationContext {
        ReconciliationContext::new(
            AddressRange::parse(prefix).unwrap(),
            "jdoe",
            Some("ORG-LIR1-RIPE".to_string()),
            Some("POOL".to_string()),
            Some("DE".to_string()),
            environment,
        )
    }

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs.iter().map(|(n, v)| Attribute::new(*n, *v)).collect()
    }

    fn production() -> MergeEngine {
        MergeEngine::new(SandboxOverrides::default())
    }

    #[test]
    fn test_dynamic_attributes_only() {
        let mut ctx = context("192.0.2.0/24", Environment::Production);
        let merged = production().merge(&mut ctx, &[], &[]);
        assert_eq!(
            merged.into_vec(),
            attrs(&[
                ("inetnum", "192.0.2.0 - 192.0.2.255"),
                ("netname", "POOL"),
                ("org", "ORG-LIR1-RIPE"),
                ("status", "ASSIGNED PA"),
                ("country", "DE"),
            ])
        );
    }

    #[test]
    fn test_template_org_overrides_context() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = production().merge(&mut ctx, &attrs(&[("org", "ORG-TPL1-RIPE")]), &[]);
        assert_eq!(ctx.org.as_deref(), Some("ORG-TPL1-RIPE"));
        assert_eq!(merged.get("org"), Some("ORG-TPL1-RIPE"));
        assert_eq!(merged.values("org").count(), 1);
    }

    #[test]
    fn test_master_org_wins_over_template_org() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        production().merge(
            &mut ctx,
            &attrs(&[("org", "ORG-TPL1-RIPE")]),
            &attrs(&[("org", "ORG-MST1-RIPE")]),
        );
        assert_eq!(ctx.org.as_deref(), Some("ORG-MST1-RIPE"));
    }

    #[test]
    fn test_template_suppresses_master_duplicates_except_descr_and_country() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = production().merge(
            &mut ctx,
            &attrs(&[("descr", "tpl"), ("mnt-by", "TPL-MNT"), ("country", "NL")]),
            &attrs(&[
                ("descr", "mst"),
                ("mnt-by", "MST-MNT"),
                ("country", "BE"),
                ("source", "RIPE"),
            ]),
        );
        assert_eq!(merged.values("mnt-by").collect::<Vec<_>>(), vec!["TPL-MNT"]);
        assert_eq!(merged.values("descr").collect::<Vec<_>>(), vec!["tpl", "mst"]);
        assert_eq!(merged.values("country").collect::<Vec<_>>(), vec!["DE", "NL", "BE"]);
    }

    #[test]
    fn test_empty_template_value_does_not_suppress_master() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = production().merge(
            &mut ctx,
            &attrs(&[("mnt-by", "")]),
            &attrs(&[("mnt-by", "MST-MNT")]),
        );
        assert_eq!(merged.get("mnt-by"), Some("MST-MNT"));
    }

    #[test]
    fn test_multiple_descr_keep_source_order_and_shift_country() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = production().merge(
            &mut ctx,
            &attrs(&[("descr", "first"), ("descr", "second")]),
            &attrs(&[("remarks", "r"), ("source", "RIPE")]),
        );
        assert_eq!(
            merged.names(),
            vec![
                "inet6num", "netname", "descr", "descr", "org", "country", "remarks", "status",
                "source"
            ]
        );
        assert_eq!(merged.values("descr").collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn test_supplied_status_moves_to_second_to_last() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = production().merge(
            &mut ctx,
            &attrs(&[("status", "AGGREGATED-BY-LIR")]),
            &attrs(&[("remarks", "r"), ("source", "RIPE")]),
        );
        let names = merged.names();
        assert_eq!(names[names.len() - 2], "status");
        assert_eq!(merged.get("status"), Some("AGGREGATED-BY-LIR"));
        assert_eq!(merged.values("status").count(), 1);
    }

    #[test]
    fn test_missing_values_are_dropped() {
        let mut ctx = context("2001:db8::/48", Environment::Production);
        ctx.org = None;
        ctx.country = None;
        let merged = production().merge(&mut ctx, &[], &attrs(&[("source", "RIPE")]));
        assert_eq!(merged.names(), vec!["inet6num", "netname", "status", "source"]);
    }

    #[test]
    fn test_sandbox_overrides() {
        let engine = MergeEngine::new(SandboxOverrides::default());
        let mut ctx = context("192.0.2.0/24", Environment::Sandbox);
        let merged = engine.merge(
            &mut ctx,
            &[],
            &attrs(&[
                ("mnt-lower", "LIR-MNT"),
                ("abuse-c", "LIR1-RIPE"),
                ("status", "ASSIGNED PA"),
                ("source", "RIPE"),
            ]),
        );
        assert_eq!(merged.get("org"), Some("ORG-EIPB1-TEST"));
        assert_eq!(merged.get("mnt-lower"), Some("TEST-DBM-MNT"));
        assert_eq!(merged.get("abuse-c"), Some("AA1-TEST"));
        assert_eq!(merged.get("status"), Some("ALLOCATED PA"));
        assert_eq!(merged.get("source"), Some("TEST"));
        assert_eq!(ctx.status, "ALLOCATED PA");
    }

    #[test]
    fn test_environment_comes_from_context() {
        let engine = MergeEngine::new(SandboxOverrides::default());
        let master = attrs(&[("mnt-by", "LIR-MNT"), ("source", "RIPE")]);

        let mut ctx = context("2001:db8::/48", Environment::Production);
        let merged = engine.merge(&mut ctx, &[], &master);
        assert_eq!(merged.get("mnt-by"), Some("LIR-MNT"));
        assert_eq!(merged.get("source"), Some("RIPE"));
        assert_eq!(ctx.status, "ASSIGNED");

        let mut ctx = context("2001:db8::/48", Environment::Sandbox);
        let merged = engine.merge(&mut ctx, &[], &master);
        assert_eq!(merged.get("mnt-by"), Some("TEST-DBM-MNT"));
        assert_eq!(merged.get("source"), Some("TEST"));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let engine = MergeEngine::new(SandboxOverrides::default());
        let template = attrs(&[("descr", "a"), ("notify", "noc@example.com")]);
        let master = attrs(&[("remarks", "r"), ("mnt-by", "X-MNT"), ("source", "RIPE")]);

        let mut first_ctx = context("2001:db8::/48", Environment::Sandbox);
        let first = engine.merge(&mut first_ctx, &template, &master);
        for _ in 0..5 {
            let mut ctx = context("2001:db8::/48", Environment::Sandbox);
            assert_eq!(engine.merge(&mut ctx, &template, &master), first);
        }
    }
}
