/// Static assignment routing. The table is immutable configuration built
/// once at startup; resolution is pure keyword matching with a
/// source-level fallback, so identical input always yields the identical
/// suggestion.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
    source_fallbacks: Vec<(&'static str, &'static str)>,
}

#[derive(Debug, Clone)]
struct RoutingRule {
    keywords: &'static [&'static str],
    owner: &'static str,
}

impl RoutingTable {
    /// The production routing table used by the sales console.
    pub fn standard() -> Self {
        RoutingTable {
            rules: vec![
                RoutingRule {
                    keywords: &["microsoft 365", "m365", "office 365", "exchange"],
                    owner: "Priya Sharma",
                },
                RoutingRule {
                    keywords: &["google workspace", "workspace", "gsuite"],
                    owner: "Arjun Mehta",
                },
                RoutingRule {
                    keywords: &["endpoint", "antivirus", "edr", "security"],
                    owner: "Rohit Verma",
                },
                RoutingRule {
                    keywords: &["backup", "acronis", "disaster recovery"],
                    owner: "Neha Kapoor",
                },
                RoutingRule {
                    keywords: &["azure", "aws", "cloud"],
                    owner: "Arjun Mehta",
                },
            ],
            source_fallbacks: vec![
                ("referral", "Priya Sharma"),
                ("google-ads", "Rohit Verma"),
            ],
        }
    }

    /// Resolve the suggested owner for a requirement description and
    /// source label. `None` is the well-defined "unassigned" fallback
    /// when neither a keyword rule nor a source rule matches.
    pub fn resolve(&self, requirement: &str, source: Option<&str>) -> Option<&'static str> {
        let requirement = requirement.trim().to_ascii_lowercase();
        for rule in &self.rules {
            if rule
                .keywords
                .iter()
                .any(|keyword| requirement.contains(keyword))
            {
                return Some(rule.owner);
            }
        }

        let source = source?.trim().to_ascii_lowercase();
        self.source_fallbacks
            .iter()
            .find(|(label, _)| source.contains(label))
            .map(|(_, owner)| *owner)
    }

    /// Distinct agent roster, in rule order, for console metadata.
    pub fn agents(&self) -> Vec<&'static str> {
        let mut agents = Vec::new();
        for owner in self
            .rules
            .iter()
            .map(|rule| rule.owner)
            .chain(self.source_fallbacks.iter().map(|(_, owner)| *owner))
        {
            if !agents.contains(&owner) {
                agents.push(owner);
            }
        }
        agents
    }
}
