//! Coscheduling plugin — gang sizing and pod-group labeling
//!
//! When the runtime carries a coscheduling policy, the whole topology
//! must be admitted atomically: minMember is the pod count summed over
//! every group, minResources the replica-weighted sum of per-pod
//! container requests. The pod-group label stamped on every pod
//! template is the only coupling contract with the external scheduler.

use std::collections::BTreeMap;

use kube::ResourceExt;
use tracing::debug;

use tensile_common::crd::{TrainJob, TrainingRuntimeSpec};
use tensile_common::{quantity, POD_GROUP_LABEL};
use tensile_jobset::PodGroupSpec;

use crate::error::AssemblyError;
use crate::plugins::Assembly;
use crate::topology;

/// Default seconds the scheduler waits for a full gang
const DEFAULT_SCHEDULE_TIMEOUT_SECONDS: i32 = 60;

pub(crate) fn apply(
    assembly: &mut Assembly,
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
) -> Result<(), AssemblyError> {
    let Some(coscheduling) = runtime
        .pod_group_policy
        .as_ref()
        .and_then(|p| p.coscheduling.as_ref())
    else {
        return Ok(());
    };

    let group_name = job.name_any();

    for group in &mut assembly.spec.replicated_jobs {
        let meta = group.template.metadata.get_or_insert_with(Default::default);
        meta.labels
            .get_or_insert_with(Default::default)
            .insert(POD_GROUP_LABEL.to_string(), group_name.clone());
    }

    let mut min_member: u32 = 0;
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for group in &assembly.spec.replicated_jobs {
        min_member += group.replicas;
        topology::accumulate_pod_requests(group, &mut totals)?;
    }

    debug!(
        job = %group_name,
        min_member,
        "sized gang-scheduling group"
    );

    assembly.pod_group = Some(PodGroupSpec {
        min_member,
        min_resources: quantity::to_resource_list(&totals),
        schedule_timeout_seconds: Some(
            coscheduling
                .schedule_timeout_seconds
                .unwrap_or(DEFAULT_SCHEDULE_TIMEOUT_SECONDS),
        ),
    });

    Ok(())
}
