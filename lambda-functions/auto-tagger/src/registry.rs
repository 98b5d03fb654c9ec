//! Declarative registry of taggable service groups.
//!
//! The engine walks [`ServiceGroup::ALL`] in a fixed order instead of a chain
//! of per-service call sites, so adding a service means adding one variant,
//! one name, and one enumerator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceGroup {
    Ec2,
    S3,
    Lambda,
    Rds,
    DynamoDb,
    Ecs,
    Eks,
    ElastiCache,
    Elb,
    Kms,
    Athena,
    /// SNS, SQS, Step Functions, Secrets Manager, and EFS.
    Additional,
}

impl ServiceGroup {
    pub const ALL: [ServiceGroup; 12] = [
        ServiceGroup::Ec2,
        ServiceGroup::S3,
        ServiceGroup::Lambda,
        ServiceGroup::Rds,
        ServiceGroup::DynamoDb,
        ServiceGroup::Ecs,
        ServiceGroup::Eks,
        ServiceGroup::ElastiCache,
        ServiceGroup::Elb,
        ServiceGroup::Kms,
        ServiceGroup::Athena,
        ServiceGroup::Additional,
    ];

    /// Name used in event payloads and log lines.
    pub fn name(self) -> &'static str {
        match self {
            ServiceGroup::Ec2 => "ec2",
            ServiceGroup::S3 => "s3",
            ServiceGroup::Lambda => "lambda",
            ServiceGroup::Rds => "rds",
            ServiceGroup::DynamoDb => "dynamodb",
            ServiceGroup::Ecs => "ecs",
            ServiceGroup::Eks => "eks",
            ServiceGroup::ElastiCache => "elasticache",
            ServiceGroup::Elb => "elb",
            ServiceGroup::Kms => "kms",
            ServiceGroup::Athena => "athena",
            ServiceGroup::Additional => "additional",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.name() == name)
    }
}

/// Service groups to run, honoring an optional allowlist from the payload.
/// Unknown names in the allowlist are ignored.
pub fn select(allowlist: Option<&[String]>) -> Vec<ServiceGroup> {
    match allowlist {
        None => ServiceGroup::ALL.to_vec(),
        Some(names) => ServiceGroup::ALL
            .iter()
            .copied()
            .filter(|group| names.iter().any(|n| n == group.name()))
            .collect(),
    }
}
