//! Helpers for navigating and mutating an assembled topology
//!
//! The merger and every plugin work on the same `JobSetSpec` value;
//! these helpers keep the Option-heavy pod-template access in one place.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::{Container, EnvVar};
use tensile_common::quantity;
use tensile_jobset::{JobSetSpec, ReplicatedJob};

use crate::error::AssemblyError;

/// Find a replicated job by name.
pub(crate) fn job<'a>(spec: &'a JobSetSpec, name: &str) -> Option<&'a ReplicatedJob> {
    spec.replicated_jobs.iter().find(|j| j.name == name)
}

/// Find a replicated job by name, mutably.
pub(crate) fn job_mut<'a>(spec: &'a mut JobSetSpec, name: &str) -> Option<&'a mut ReplicatedJob> {
    spec.replicated_jobs.iter_mut().find(|j| j.name == name)
}

/// Find a named container within a replicated job's pod template, mutably.
pub(crate) fn container_mut<'a>(
    group: &'a mut ReplicatedJob,
    name: &str,
) -> Option<&'a mut Container> {
    group
        .template
        .spec
        .as_mut()?
        .containers
        .iter_mut()
        .find(|c| c.name == name)
}

/// The first container of a replicated job's pod template, mutably.
pub(crate) fn lead_container_mut(group: &mut ReplicatedJob) -> Option<&mut Container> {
    group.template.spec.as_mut()?.containers.first_mut()
}

/// Insert or replace an environment variable on a container by name.
pub(crate) fn upsert_env(container: &mut Container, name: &str, value: &str) {
    let env = container.env.get_or_insert_with(Vec::new);
    match env.iter_mut().find(|e| e.name == name) {
        Some(existing) => {
            existing.value = Some(value.to_string());
            existing.value_from = None;
        }
        None => env.push(EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        }),
    }
}

/// Insert or replace a full environment variable (keeps `valueFrom` sources).
pub(crate) fn upsert_env_var(container: &mut Container, var: &EnvVar) {
    let env = container.env.get_or_insert_with(Vec::new);
    match env.iter_mut().find(|e| e.name == var.name) {
        Some(existing) => *existing = var.clone(),
        None => env.push(var.clone()),
    }
}

/// Add a replicated job's aggregate resource requests into `totals`,
/// in milli-units, scaled by its replica count.
///
/// Per container, the request is used when set and the limit is the
/// fallback per resource name, matching pod-effective-request semantics.
pub(crate) fn accumulate_pod_requests(
    group: &ReplicatedJob,
    totals: &mut BTreeMap<String, i64>,
) -> Result<(), AssemblyError> {
    let Some(pod_spec) = group.template.spec.as_ref() else {
        return Ok(());
    };

    let mut per_pod: BTreeMap<String, i64> = BTreeMap::new();
    let empty = BTreeMap::new();
    for container in &pod_spec.containers {
        let Some(resources) = container.resources.as_ref() else {
            continue;
        };
        let requests = resources.requests.as_ref().unwrap_or(&empty);
        let limits = resources.limits.as_ref().unwrap_or(&empty);
        let names: BTreeSet<&String> = requests.keys().chain(limits.keys()).collect();
        for name in names {
            if let Some(qty) = requests.get(name).or_else(|| limits.get(name)) {
                quantity::accumulate(&mut per_pod, name, qty).map_err(AssemblyError::Common)?;
            }
        }
    }

    for (name, milli) in per_pod {
        let scaled = milli.checked_mul(i64::from(group.replicas)).ok_or_else(|| {
            tensile_common::Error::quantity(milli.to_string(), "per-group request sum overflows")
        })?;
        let entry = totals.entry(name).or_insert(0);
        *entry = entry.checked_add(scaled).ok_or_else(|| {
            tensile_common::Error::quantity(scaled.to_string(), "topology request sum overflows")
        })?;
    }
    Ok(())
}
