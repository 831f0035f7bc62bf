//! Fixed parts of a compiled unit: the sequencing volumes, the helper bootstrap and the
//! wrapping of step processes into helper invocations.
use stepci_image::ImageCommand;
use stepci_model::{
    ANNOTATION_TASK_ORDER, Container, PullPolicy, Step, Volume, VolumeMount,
};

use crate::config::CompilerConfig;

/// emptyDir shared between the init container and every step.
pub const HELPER_VOLUME: &str = "entrypoint-volume";

/// Downward-API volume exposing the order annotation.
pub const PODINFO_VOLUME: &str = "podinfo";

pub(crate) fn volumes(config: &CompilerConfig) -> Vec<Volume> {
    vec![
        Volume::empty_dir(HELPER_VOLUME),
        Volume::annotation_file(PODINFO_VOLUME, &config.order_file, ANNOTATION_TASK_ORDER),
    ]
}

/// Init container staging the helper binary into the shared volume.
pub(crate) fn init_container(config: &CompilerConfig, unit_name: &str) -> Container {
    Container {
        name: format!("{unit_name}-init"),
        image: config.helper_image.clone(),
        image_pull_policy: Some(PullPolicy::IfNotPresent),
        command: vec![
            "cp".into(),
            config.helper_source.clone(),
            config.helper_dir.clone(),
        ],
        volume_mounts: vec![VolumeMount::new(HELPER_VOLUME, &config.helper_dir)],
        ..Default::default()
    }
}

/// Container for the step at 0-based `index`.
///
/// The helper blocks until the order file reads `index + 1`, then runs `launch`.
/// Command, args, pull policy and mounts are always set here; env, resources and
/// working directory come from the step untouched.
pub(crate) fn step_container(
    config: &CompilerConfig,
    index: usize,
    step: &Step,
    launch: ImageCommand,
) -> Container {
    let mut args = vec![
        "--wait".to_string(),
        config.order_path(),
        "--waitcontent".to_string(),
        (index + 1).to_string(),
        "--out".to_string(),
        "stdout".to_string(),
        "--command".to_string(),
        launch.command.join(" "),
    ];
    args.extend(launch.args);

    Container {
        name: step.container_name(index),
        image: step.image.clone(),
        image_pull_policy: Some(PullPolicy::IfNotPresent),
        command: vec![config.helper_binary.clone()],
        args,
        env: step.env.clone(),
        resources: step.resources.clone(),
        working_dir: step.working_dir.clone(),
        volume_mounts: vec![
            VolumeMount::new(HELPER_VOLUME, &config.helper_dir),
            VolumeMount::new(PODINFO_VOLUME, &config.podinfo_dir),
        ],
    }
}
