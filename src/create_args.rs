use crate::*;

/// Provider-level settings the provisioning tool needs on every create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgsConfig {
    pub project: String,
    pub zone: String,
    pub machine_image: String,
    pub tags: Vec<String>,
}

/// Builds the provisioning tool's arguments for one machine.
///
/// Required flags come first in a fixed order, followed by the optional
/// preemptible and tags flags. Output depends only on the inputs.
pub fn build_create_args(
    config: &CreateArgsConfig,
    profile: &MachineProfile,
) -> Result<Vec<String>> {
    if profile.machine_type.trim().is_empty() {
        return Err(Error::InvalidProfile("empty machine type".to_string()));
    }
    if profile.storage_gib == 0 {
        return Err(Error::InvalidProfile("zero disk size".to_string()));
    }

    let mut args = vec![
        "--google-project".to_string(),
        config.project.clone(),
        "--google-zone".to_string(),
        config.zone.clone(),
        "--google-machine-type".to_string(),
        profile.machine_type.clone(),
        "--google-machine-image".to_string(),
        config.machine_image.clone(),
        "--google-disk-size".to_string(),
        profile.storage_gib.to_string(),
    ];

    if profile.preemptible {
        args.push("--google-preemptible".to_string());
    }

    if !config.tags.is_empty() {
        args.push("--google-tags".to_string());
        args.push(config.tags.join(","));
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tags: &[&str]) -> CreateArgsConfig {
        CreateArgsConfig {
            project: "odm-project".to_string(),
            zone: "us-central1-a".to_string(),
            machine_image: "ubuntu-os-cloud/global/images/ubuntu-2010-groovy-v20210325"
                .to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn profile(preemptible: bool) -> MachineProfile {
        MachineProfile {
            max_batch_size: 5,
            machine_type: "n1-standard-1".to_string(),
            preemptible,
            storage_gib: 10,
        }
    }

    #[test]
    fn test_full_argument_order() {
        let args = build_create_args(&config(&["clusterodm", "odm"]), &profile(true)).unwrap();
        assert_eq!(
            args,
            vec![
                "--google-project",
                "odm-project",
                "--google-zone",
                "us-central1-a",
                "--google-machine-type",
                "n1-standard-1",
                "--google-machine-image",
                "ubuntu-os-cloud/global/images/ubuntu-2010-groovy-v20210325",
                "--google-disk-size",
                "10",
                "--google-preemptible",
                "--google-tags",
                "clusterodm,odm",
            ]
        );
    }

    #[test]
    fn test_omits_optional_flags() {
        let args = build_create_args(&config(&[]), &profile(false)).unwrap();
        assert_eq!(args.len(), 10);
        assert!(!args.iter().any(|arg| arg == "--google-preemptible"));
        assert!(!args.iter().any(|arg| arg == "--google-tags"));
    }

    #[test]
    fn test_is_deterministic() {
        let config = config(&["a", "b"]);
        let profile = profile(true);
        let first = build_create_args(&config, &profile).unwrap();
        let second = build_create_args(&config, &profile).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_malformed_profile() {
        let mut bad = profile(false);
        bad.machine_type = " ".to_string();
        assert!(matches!(
            build_create_args(&config(&[]), &bad),
            Err(Error::InvalidProfile(_))
        ));

        let mut bad = profile(false);
        bad.storage_gib = 0;
        let err = build_create_args(&config(&[]), &bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProvisioningBuild);
    }
}
