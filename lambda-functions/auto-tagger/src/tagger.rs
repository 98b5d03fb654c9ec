use std::collections::BTreeMap;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::Client as AthenaClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ecs::Client as EcsClient;
use aws_sdk_efs::Client as EfsClient;
use aws_sdk_eks::Client as EksClient;
use aws_sdk_elasticache::Client as ElastiCacheClient;
use aws_sdk_elasticloadbalancing::Client as ElbClient;
use aws_sdk_elasticloadbalancingv2::Client as Elbv2Client;
use aws_sdk_kms::{types::KeyManagerType, Client as KmsClient};
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_rds::Client as RdsClient;
use aws_sdk_resourcegroupstagging::Client as TaggingClient;
use aws_sdk_s3::{
    types::{Tag as S3Tag, Tagging},
    Client as S3Client,
};
use aws_sdk_secretsmanager::Client as SecretsClient;
use aws_sdk_sfn::Client as SfnClient;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sqs::{types::QueueAttributeName, Client as SqsClient};
use lambda_runtime::Error;
use tracing::{debug, error, info};

use crate::arn;
use crate::counters::{RunCounters, TagOutcome};
use crate::registry::{self, ServiceGroup};
use crate::tag::{TagPolicy, TargetTag};

/// Canonical region a bucket belongs to when `GetBucketLocation` returns an
/// empty or unset constraint.
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// Resolve the region a bucket lives in from its location constraint.
pub fn resolve_bucket_location(constraint: Option<&str>) -> &str {
    match constraint {
        None | Some("") => DEFAULT_BUCKET_REGION,
        Some(region) => region,
    }
}

/// Tagging engine scoped to one account and one region.
///
/// Every enumerator follows the same contract: list resources, obtain or
/// construct an ARN, apply the target tag, and record exactly one outcome per
/// resource. A failing item is logged and counted; it never aborts the loop.
pub struct ResourceTagger {
    region: String,
    account_id: String,
    tag: TargetTag,
    policy: TagPolicy,
    dry_run: bool,
    counters: RunCounters,
    ec2: Ec2Client,
    s3: S3Client,
    lambda: LambdaClient,
    rds: RdsClient,
    dynamodb: DynamoClient,
    ecs: EcsClient,
    eks: EksClient,
    elasticache: ElastiCacheClient,
    elb: ElbClient,
    elbv2: Elbv2Client,
    kms: KmsClient,
    athena: AthenaClient,
    sns: SnsClient,
    sqs: SqsClient,
    sfn: SfnClient,
    secrets: SecretsClient,
    efs: EfsClient,
    tagging: TaggingClient,
}

impl ResourceTagger {
    pub async fn new(
        region: &str,
        tag: TargetTag,
        policy: TagPolicy,
        dry_run: bool,
    ) -> Result<Self, Error> {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        // Resolved once so ARN templates never need a per-item STS call.
        let identity = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await?;
        let account_id = identity
            .account()
            .ok_or("caller identity did not include an account id")?
            .to_string();

        Ok(Self {
            region: region.to_string(),
            account_id,
            tag,
            policy,
            dry_run,
            counters: RunCounters::default(),
            ec2: Ec2Client::new(&config),
            s3: S3Client::new(&config),
            lambda: LambdaClient::new(&config),
            rds: RdsClient::new(&config),
            dynamodb: DynamoClient::new(&config),
            ecs: EcsClient::new(&config),
            eks: EksClient::new(&config),
            elasticache: ElastiCacheClient::new(&config),
            elb: ElbClient::new(&config),
            elbv2: Elbv2Client::new(&config),
            kms: KmsClient::new(&config),
            athena: AthenaClient::new(&config),
            sns: SnsClient::new(&config),
            sqs: SqsClient::new(&config),
            sfn: SfnClient::new(&config),
            secrets: SecretsClient::new(&config),
            efs: EfsClient::new(&config),
            tagging: TaggingClient::new(&config),
        })
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Run every registered service group (or the payload's allowlist) and
    /// return the labels of processed resources, keyed by group name.
    pub async fn tag_all_resources(
        &mut self,
        allowlist: Option<&[String]>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut resources = BTreeMap::new();
        for group in registry::select(allowlist) {
            info!("processing {} resources in {}", group.name(), self.region);
            let labels = self.run_group(group).await;
            resources.insert(group.name().to_string(), labels);
        }
        resources
    }

    pub async fn run_group(&mut self, group: ServiceGroup) -> Vec<String> {
        match group {
            ServiceGroup::Ec2 => self.tag_ec2_resources().await,
            ServiceGroup::S3 => self.tag_s3_buckets().await,
            ServiceGroup::Lambda => self.tag_lambda_functions().await,
            ServiceGroup::Rds => self.tag_rds_resources().await,
            ServiceGroup::DynamoDb => self.tag_dynamodb_tables().await,
            ServiceGroup::Ecs => self.tag_ecs_resources().await,
            ServiceGroup::Eks => self.tag_eks_clusters().await,
            ServiceGroup::ElastiCache => self.tag_elasticache_resources().await,
            ServiceGroup::Elb => self.tag_load_balancers().await,
            ServiceGroup::Kms => self.tag_kms_keys().await,
            ServiceGroup::Athena => self.tag_athena_workgroups().await,
            ServiceGroup::Additional => self.tag_additional_services().await,
        }
    }

    /// Apply the target tag through the Resource Groups Tagging API.
    /// Returns true when the resource counts as processed (tagged or dry-run).
    async fn tag_arn(&mut self, resource_arn: &str, label: &str) -> bool {
        if self.dry_run {
            info!("[dry run] would tag {label}: {resource_arn}");
            self.counters.record(TagOutcome::WouldTag);
            return true;
        }

        match self
            .tagging
            .tag_resources()
            .resource_arn_list(resource_arn)
            .tags(&self.tag.key, &self.tag.value)
            .send()
            .await
        {
            Ok(_) => {
                info!("tagged {label}: {resource_arn}");
                self.counters.record(TagOutcome::Tagged);
                true
            }
            Err(e) => {
                error!("failed to tag {label} {resource_arn}: {e}");
                self.counters.record(TagOutcome::Failed);
                false
            }
        }
    }

    /// EC2 accepts bare resource IDs through its own `CreateTags` call.
    async fn tag_ec2_id(&mut self, resource_id: &str, label: &str) -> bool {
        if self.dry_run {
            info!("[dry run] would tag {label}: {resource_id}");
            self.counters.record(TagOutcome::WouldTag);
            return true;
        }

        let tag = aws_sdk_ec2::types::Tag::builder()
            .key(&self.tag.key)
            .value(&self.tag.value)
            .build();

        match self
            .ec2
            .create_tags()
            .resources(resource_id)
            .tags(tag)
            .send()
            .await
        {
            Ok(_) => {
                info!("tagged {label}: {resource_id}");
                self.counters.record(TagOutcome::Tagged);
                true
            }
            Err(e) => {
                error!("failed to tag {label} {resource_id}: {e}");
                self.counters.record(TagOutcome::Failed);
                false
            }
        }
    }

    fn record_listing_failure(&mut self, what: &str, err: &dyn std::fmt::Display) {
        error!("error listing {what} in {}: {err}", self.region);
        self.counters.record(TagOutcome::Failed);
    }

    /// EC2 instances, EBS volumes, EBS snapshots (owned by this account), and
    /// transit gateways.
    async fn tag_ec2_resources(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let mut reservations = self.ec2.describe_instances().into_paginator().items().send();
        loop {
            match reservations.next().await {
                Some(Ok(reservation)) => {
                    for instance in reservation.instances() {
                        if let Some(id) = instance.instance_id() {
                            let id = id.to_string();
                            if self.tag_ec2_id(&id, "EC2 instance").await {
                                results.push(format!("ec2-instance:{id}"));
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("EC2 instances", &e);
                    break;
                }
                None => break,
            }
        }

        let mut volumes = self.ec2.describe_volumes().into_paginator().items().send();
        loop {
            match volumes.next().await {
                Some(Ok(volume)) => {
                    if let Some(id) = volume.volume_id() {
                        let id = id.to_string();
                        if self.tag_ec2_id(&id, "EBS volume").await {
                            results.push(format!("ebs-volume:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("EBS volumes", &e);
                    break;
                }
                None => break,
            }
        }

        let mut snapshots = self
            .ec2
            .describe_snapshots()
            .owner_ids("self")
            .into_paginator()
            .items()
            .send();
        loop {
            match snapshots.next().await {
                Some(Ok(snapshot)) => {
                    if let Some(id) = snapshot.snapshot_id() {
                        let id = id.to_string();
                        if self.tag_ec2_id(&id, "EBS snapshot").await {
                            results.push(format!("ebs-snapshot:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("EBS snapshots", &e);
                    break;
                }
                None => break,
            }
        }

        let mut gateways = self
            .ec2
            .describe_transit_gateways()
            .into_paginator()
            .items()
            .send();
        loop {
            match gateways.next().await {
                Some(Ok(gateway)) => {
                    if let Some(id) = gateway.transit_gateway_id() {
                        let id = id.to_string();
                        if self.tag_ec2_id(&id, "transit gateway").await {
                            results.push(format!("transit-gateway:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("transit gateways", &e);
                    break;
                }
                None => break,
            }
        }

        results
    }

    /// Buckets are global in the listing but regional for tagging: each
    /// bucket's own region is resolved first and only buckets belonging to
    /// this pass's region are tagged, so the write always goes to the right
    /// endpoint. Buckets with an unset location resolve to us-east-1.
    async fn tag_s3_buckets(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let buckets = match self.s3.list_buckets().send().await {
            Ok(out) => out.buckets().to_vec(),
            Err(e) => {
                self.record_listing_failure("S3 buckets", &e);
                return results;
            }
        };

        for bucket in buckets {
            let Some(name) = bucket.name() else { continue };
            let name = name.to_string();

            let bucket_region = match self.s3.get_bucket_location().bucket(&name).send().await {
                Ok(out) => {
                    resolve_bucket_location(out.location_constraint().map(|c| c.as_str()))
                        .to_string()
                }
                Err(e) => {
                    error!("failed to resolve region for bucket {name}: {e}");
                    self.counters.record(TagOutcome::Failed);
                    continue;
                }
            };

            if bucket_region != self.region {
                debug!("skipping bucket {name}: lives in {bucket_region}");
                continue;
            }

            if self.dry_run {
                info!("[dry run] would tag S3 bucket: {name}");
                self.counters.record(TagOutcome::WouldTag);
                results.push(format!("s3-bucket:{name}"));
                continue;
            }

            match self.apply_bucket_tag(&name).await {
                Ok(()) => {
                    info!("tagged S3 bucket: {name}");
                    self.counters.record(TagOutcome::Tagged);
                    results.push(format!("s3-bucket:{name}"));
                }
                Err(e) => {
                    error!("failed to tag S3 bucket {name}: {e}");
                    self.counters.record(TagOutcome::Failed);
                }
            }
        }

        results
    }

    /// `PutBucketTagging` replaces the whole tag set, so the existing tags are
    /// fetched and merged with the target tag replacing any stale value under
    /// the same key.
    async fn apply_bucket_tag(&self, bucket: &str) -> Result<(), Error> {
        let mut tag_set = match self.s3.get_bucket_tagging().bucket(bucket).send().await {
            Ok(out) => out.tag_set().to_vec(),
            // NoSuchTagSet: the bucket has no tags yet.
            Err(_) => Vec::new(),
        };

        tag_set.retain(|t| t.key() != self.tag.key.as_str());
        tag_set.push(
            S3Tag::builder()
                .key(&self.tag.key)
                .value(&self.tag.value)
                .build()?,
        );

        let tagging = Tagging::builder().set_tag_set(Some(tag_set)).build()?;
        self.s3
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging)
            .send()
            .await?;
        Ok(())
    }

    async fn tag_lambda_functions(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut functions = self.lambda.list_functions().into_paginator().items().send();
        loop {
            match functions.next().await {
                Some(Ok(function)) => {
                    if let (Some(function_arn), Some(name)) =
                        (function.function_arn(), function.function_name())
                    {
                        let function_arn = function_arn.to_string();
                        let name = name.to_string();
                        if self.tag_arn(&function_arn, "Lambda function").await {
                            results.push(format!("lambda:{name}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("Lambda functions", &e);
                    break;
                }
                None => break,
            }
        }
        results
    }

    /// RDS DB instances and DB clusters; both describe calls return full ARNs.
    async fn tag_rds_resources(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let mut instances = self
            .rds
            .describe_db_instances()
            .into_paginator()
            .items()
            .send();
        loop {
            match instances.next().await {
                Some(Ok(db)) => {
                    if let (Some(db_arn), Some(id)) =
                        (db.db_instance_arn(), db.db_instance_identifier())
                    {
                        let db_arn = db_arn.to_string();
                        let id = id.to_string();
                        if self.tag_arn(&db_arn, "RDS instance").await {
                            results.push(format!("rds-instance:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("RDS instances", &e);
                    break;
                }
                None => break,
            }
        }

        let mut clusters = self
            .rds
            .describe_db_clusters()
            .into_paginator()
            .items()
            .send();
        loop {
            match clusters.next().await {
                Some(Ok(cluster)) => {
                    if let (Some(cluster_arn), Some(id)) =
                        (cluster.db_cluster_arn(), cluster.db_cluster_identifier())
                    {
                        let cluster_arn = cluster_arn.to_string();
                        let id = id.to_string();
                        if self.tag_arn(&cluster_arn, "RDS cluster").await {
                            results.push(format!("rds-cluster:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("RDS clusters", &e);
                    break;
                }
                None => break,
            }
        }

        results
    }

    async fn tag_dynamodb_tables(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut tables = self.dynamodb.list_tables().into_paginator().items().send();
        loop {
            match tables.next().await {
                Some(Ok(table_name)) => {
                    match self
                        .dynamodb
                        .describe_table()
                        .table_name(&table_name)
                        .send()
                        .await
                    {
                        Ok(out) => {
                            if let Some(table_arn) = out.table().and_then(|t| t.table_arn()) {
                                let table_arn = table_arn.to_string();
                                if self.tag_arn(&table_arn, "DynamoDB table").await {
                                    results.push(format!("dynamodb:{table_name}"));
                                }
                            }
                        }
                        Err(e) => {
                            error!("failed to describe DynamoDB table {table_name}: {e}");
                            self.counters.record(TagOutcome::Failed);
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("DynamoDB tables", &e);
                    break;
                }
                None => break,
            }
        }
        results
    }

    /// Nested enumeration: clusters first, then the services inside each one.
    async fn tag_ecs_resources(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut cluster_arns = Vec::new();

        let mut clusters = self.ecs.list_clusters().into_paginator().items().send();
        loop {
            match clusters.next().await {
                Some(Ok(cluster_arn)) => cluster_arns.push(cluster_arn),
                Some(Err(e)) => {
                    self.record_listing_failure("ECS clusters", &e);
                    break;
                }
                None => break,
            }
        }

        for cluster_arn in cluster_arns {
            let short = cluster_arn.rsplit('/').next().unwrap_or(&cluster_arn);
            let short = short.to_string();
            if self.tag_arn(&cluster_arn, "ECS cluster").await {
                results.push(format!("ecs-cluster:{short}"));
            }

            let mut services = self
                .ecs
                .list_services()
                .cluster(&cluster_arn)
                .into_paginator()
                .items()
                .send();
            loop {
                match services.next().await {
                    Some(Ok(service_arn)) => {
                        let short = service_arn.rsplit('/').next().unwrap_or(&service_arn);
                        let short = short.to_string();
                        if self.tag_arn(&service_arn, "ECS service").await {
                            results.push(format!("ecs-service:{short}"));
                        }
                    }
                    Some(Err(e)) => {
                        self.record_listing_failure("ECS services", &e);
                        break;
                    }
                    None => break,
                }
            }
        }

        results
    }

    async fn tag_eks_clusters(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut clusters = self.eks.list_clusters().into_paginator().items().send();
        loop {
            match clusters.next().await {
                Some(Ok(cluster_name)) => {
                    match self
                        .eks
                        .describe_cluster()
                        .name(&cluster_name)
                        .send()
                        .await
                    {
                        Ok(out) => {
                            if let Some(cluster_arn) = out.cluster().and_then(|c| c.arn()) {
                                let cluster_arn = cluster_arn.to_string();
                                if self.tag_arn(&cluster_arn, "EKS cluster").await {
                                    results.push(format!("eks:{cluster_name}"));
                                }
                            }
                        }
                        Err(e) => {
                            error!("failed to describe EKS cluster {cluster_name}: {e}");
                            self.counters.record(TagOutcome::Failed);
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("EKS clusters", &e);
                    break;
                }
                None => break,
            }
        }
        results
    }

    /// Cache clusters and replication groups. Entries without an ARN in the
    /// response are skipped.
    async fn tag_elasticache_resources(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let mut clusters = self
            .elasticache
            .describe_cache_clusters()
            .into_paginator()
            .items()
            .send();
        loop {
            match clusters.next().await {
                Some(Ok(cluster)) => {
                    if let (Some(cluster_arn), Some(id)) = (cluster.arn(), cluster.cache_cluster_id())
                    {
                        let cluster_arn = cluster_arn.to_string();
                        let id = id.to_string();
                        if self.tag_arn(&cluster_arn, "ElastiCache cluster").await {
                            results.push(format!("elasticache-cluster:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("ElastiCache clusters", &e);
                    break;
                }
                None => break,
            }
        }

        let mut groups = self
            .elasticache
            .describe_replication_groups()
            .into_paginator()
            .items()
            .send();
        loop {
            match groups.next().await {
                Some(Ok(group)) => {
                    if let (Some(group_arn), Some(id)) = (group.arn(), group.replication_group_id())
                    {
                        let group_arn = group_arn.to_string();
                        let id = id.to_string();
                        if self
                            .tag_arn(&group_arn, "ElastiCache replication group")
                            .await
                        {
                            results.push(format!("elasticache-rg:{id}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("ElastiCache replication groups", &e);
                    break;
                }
                None => break,
            }
        }

        results
    }

    /// ALB/NLB carry ARNs and go through the generic tagging API; classic
    /// load balancers only support their own name-keyed `AddTags` call.
    async fn tag_load_balancers(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let mut balancers = self
            .elbv2
            .describe_load_balancers()
            .into_paginator()
            .items()
            .send();
        loop {
            match balancers.next().await {
                Some(Ok(lb)) => {
                    if let (Some(lb_arn), Some(name)) =
                        (lb.load_balancer_arn(), lb.load_balancer_name())
                    {
                        let lb_arn = lb_arn.to_string();
                        let name = name.to_string();
                        if self.tag_arn(&lb_arn, "load balancer").await {
                            results.push(format!("alb-nlb:{name}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("load balancers", &e);
                    break;
                }
                None => break,
            }
        }

        let mut classic = self
            .elb
            .describe_load_balancers()
            .into_paginator()
            .items()
            .send();
        loop {
            match classic.next().await {
                Some(Ok(lb)) => {
                    if let Some(name) = lb.load_balancer_name() {
                        let name = name.to_string();
                        if self.tag_classic_load_balancer(&name).await {
                            results.push(format!("classic-lb:{name}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("classic load balancers", &e);
                    break;
                }
                None => break,
            }
        }

        results
    }

    async fn tag_classic_load_balancer(&mut self, name: &str) -> bool {
        if self.dry_run {
            info!("[dry run] would tag classic load balancer: {name}");
            self.counters.record(TagOutcome::WouldTag);
            return true;
        }

        let tag = match aws_sdk_elasticloadbalancing::types::Tag::builder()
            .key(&self.tag.key)
            .value(&self.tag.value)
            .build()
        {
            Ok(tag) => tag,
            Err(e) => {
                error!("failed to build tag for classic load balancer {name}: {e}");
                self.counters.record(TagOutcome::Failed);
                return false;
            }
        };

        match self
            .elb
            .add_tags()
            .load_balancer_names(name)
            .tags(tag)
            .send()
            .await
        {
            Ok(_) => {
                info!("tagged classic load balancer: {name}");
                self.counters.record(TagOutcome::Tagged);
                true
            }
            Err(e) => {
                error!("failed to tag classic load balancer {name}: {e}");
                self.counters.record(TagOutcome::Failed);
                false
            }
        }
    }

    /// Only customer-managed keys are eligible; AWS-managed keys are skipped
    /// without counting since they were never candidates.
    async fn tag_kms_keys(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut keys = self.kms.list_keys().into_paginator().items().send();
        loop {
            match keys.next().await {
                Some(Ok(entry)) => {
                    let (Some(key_id), Some(key_arn)) = (entry.key_id(), entry.key_arn()) else {
                        continue;
                    };
                    let key_id = key_id.to_string();
                    let key_arn = key_arn.to_string();

                    match self.kms.describe_key().key_id(&key_id).send().await {
                        Ok(out) => {
                            let customer_managed = out
                                .key_metadata()
                                .map(|meta| {
                                    matches!(meta.key_manager(), Some(KeyManagerType::Customer))
                                })
                                .unwrap_or(false);
                            if !customer_managed {
                                debug!("skipping AWS-managed key: {key_id}");
                                continue;
                            }
                            if self.tag_arn(&key_arn, "KMS key").await {
                                results.push(format!("kms-key:{key_id}"));
                            }
                        }
                        Err(e) => {
                            error!("failed to describe KMS key {key_id}: {e}");
                            self.counters.record(TagOutcome::Failed);
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("KMS keys", &e);
                    break;
                }
                None => break,
            }
        }
        results
    }

    /// Workgroup ARNs are constructed from region + account id; excluded
    /// workgroups (the undeletable `primary` by default) are skipped.
    async fn tag_athena_workgroups(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut workgroups = self
            .athena
            .list_work_groups()
            .into_paginator()
            .items()
            .send();
        loop {
            match workgroups.next().await {
                Some(Ok(summary)) => {
                    let Some(name) = summary.name() else { continue };
                    let name = name.to_string();
                    if self.policy.is_workgroup_excluded(&name) {
                        debug!("skipping excluded Athena workgroup: {name}");
                        continue;
                    }
                    let workgroup_arn =
                        arn::athena_workgroup(&self.region, &self.account_id, &name);
                    if self.tag_arn(&workgroup_arn, "Athena workgroup").await {
                        results.push(format!("athena-workgroup:{name}"));
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("Athena workgroups", &e);
                    break;
                }
                None => break,
            }
        }
        results
    }

    /// SNS topics, SQS queues, Step Functions state machines, Secrets Manager
    /// secrets, and EFS file systems. Each sub-service fails independently.
    async fn tag_additional_services(&mut self) -> Vec<String> {
        let mut results = Vec::new();

        let mut topics = self.sns.list_topics().into_paginator().items().send();
        loop {
            match topics.next().await {
                Some(Ok(topic)) => {
                    if let Some(topic_arn) = topic.topic_arn() {
                        let topic_arn = topic_arn.to_string();
                        let short = topic_arn
                            .rsplit(':')
                            .next()
                            .unwrap_or(&topic_arn)
                            .to_string();
                        if self.tag_arn(&topic_arn, "SNS topic").await {
                            results.push(format!("sns:{short}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("SNS topics", &e);
                    break;
                }
                None => break,
            }
        }

        let mut queues = self.sqs.list_queues().into_paginator().items().send();
        loop {
            match queues.next().await {
                Some(Ok(queue_url)) => {
                    match self
                        .sqs
                        .get_queue_attributes()
                        .queue_url(&queue_url)
                        .attribute_names(QueueAttributeName::QueueArn)
                        .send()
                        .await
                    {
                        Ok(out) => {
                            let queue_arn = out
                                .attributes()
                                .and_then(|attrs| attrs.get(&QueueAttributeName::QueueArn))
                                .cloned();
                            if let Some(queue_arn) = queue_arn {
                                let short = queue_url
                                    .rsplit('/')
                                    .next()
                                    .unwrap_or(&queue_url)
                                    .to_string();
                                if self.tag_arn(&queue_arn, "SQS queue").await {
                                    results.push(format!("sqs:{short}"));
                                }
                            }
                        }
                        Err(e) => {
                            error!("failed to resolve ARN for queue {queue_url}: {e}");
                            self.counters.record(TagOutcome::Failed);
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("SQS queues", &e);
                    break;
                }
                None => break,
            }
        }

        let mut machines = self
            .sfn
            .list_state_machines()
            .into_paginator()
            .items()
            .send();
        loop {
            match machines.next().await {
                Some(Ok(machine)) => {
                    let machine_arn = machine.state_machine_arn().to_string();
                    let name = machine.name().to_string();
                    if self.tag_arn(&machine_arn, "state machine").await {
                        results.push(format!("stepfunctions:{name}"));
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("Step Functions state machines", &e);
                    break;
                }
                None => break,
            }
        }

        let mut secrets = self.secrets.list_secrets().into_paginator().items().send();
        loop {
            match secrets.next().await {
                Some(Ok(secret)) => {
                    if let (Some(secret_arn), Some(name)) = (secret.arn(), secret.name()) {
                        let secret_arn = secret_arn.to_string();
                        let name = name.to_string();
                        if self.tag_arn(&secret_arn, "secret").await {
                            results.push(format!("secret:{name}"));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("secrets", &e);
                    break;
                }
                None => break,
            }
        }

        let mut file_systems = self
            .efs
            .describe_file_systems()
            .into_paginator()
            .items()
            .send();
        loop {
            match file_systems.next().await {
                Some(Ok(fs)) => {
                    let id = fs.file_system_id().to_string();
                    let fs_arn = arn::efs_file_system(&self.region, &self.account_id, &id);
                    if self.tag_arn(&fs_arn, "EFS file system").await {
                        results.push(format!("efs:{id}"));
                    }
                }
                Some(Err(e)) => {
                    self.record_listing_failure("EFS file systems", &e);
                    break;
                }
                None => break,
            }
        }

        results
    }
}
