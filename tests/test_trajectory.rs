use acereport::plot::{
    archive_path, layout_trajectory, load_trajectory_archive, plot_trajectory, save_trajectory_archive,
    TrajectoryData, TriggerMarker, TriggerMarkers,
};
use std::path::Path;

fn sample_data() -> TrajectoryData {
    let mut data = TrajectoryData::new();
    data.push("PE", vec![-3.0, -3.1, -3.2, -3.15]);
    data.push("T", vec![300.0, 310.0, 305.0, 320.0]);
    data.push("criterion", vec![1.0, 0.5, 0.1, 0.01]);
    data
}

#[test]
fn test_csv_to_archive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("traj.csv");
    std::fs::write(&csv_path, "PE,T,criterion\n-3.0,300,1.0\n-3.1,310,0.5\n-3.2,305,0.1\n-3.15,320,0.01\n").unwrap();

    let data = TrajectoryData::from_csv(&csv_path).unwrap();
    assert_eq!(data, sample_data());

    let archive = archive_path(&dir.path().join("traj.png"));
    assert_eq!(archive.file_name().unwrap(), "traj.png.npz");
    save_trajectory_archive(&data, &archive).unwrap();

    let reloaded = load_trajectory_archive(&archive).unwrap();
    assert_eq!(reloaded.names(), vec!["PE", "T", "criterion"]);
    assert_eq!(reloaded.get("T").unwrap(), &[300.0, 310.0, 305.0, 320.0]);
}

#[test]
fn test_layout_with_triggers() {
    let data = sample_data();
    let mut triggers = TriggerMarkers::new();
    triggers.insert("criterion".to_string(), TriggerMarker { x: Some(2.0), y: Some(0.2) });
    triggers.insert("PE".to_string(), TriggerMarker { x: None, y: Some(100.0) });

    let layout = layout_trajectory(&data, &triggers, &["criterion".to_string()]);
    assert_eq!(layout.len(), 3);

    let criterion = &layout[2];
    assert!(criterion.log_scale);
    assert_eq!(criterion.overlays.vertical, Some(2.0));
    assert_eq!(criterion.overlays.horizontal, Some(0.2));

    let pe = &layout[0];
    assert!(!pe.log_scale);
    assert_eq!(pe.overlays.horizontal, None);
    assert_eq!(pe.overlays.vertical, None);

    assert!(layout[1].overlays.vertical.is_none());
}

fn render_and_check(plot_file: &Path) {
    let data = sample_data();
    let mut triggers = TriggerMarkers::new();
    triggers.insert("criterion".to_string(), TriggerMarker { x: Some(2.0), y: Some(0.2) });
    triggers.insert("T".to_string(), TriggerMarker { x: None, y: Some(308.0) });

    let layout = plot_trajectory(&data, &triggers, plot_file, &["criterion".to_string()]).unwrap();
    assert_eq!(layout.len(), 3);
    assert!(layout[2].log_scale);

    let image = std::fs::metadata(plot_file).unwrap();
    assert!(image.len() > 0);

    let archive = archive_path(plot_file);
    assert!(archive.exists());
    assert_eq!(load_trajectory_archive(&archive).unwrap(), data);
}

#[test]
fn test_plot_trajectory_png() {
    let dir = tempfile::tempdir().unwrap();
    let plot_file = dir.path().join("run.png");
    render_and_check(&plot_file);
    assert!(dir.path().join("run.png.npz").exists());
}

#[test]
fn test_plot_trajectory_svg() {
    let dir = tempfile::tempdir().unwrap();
    let plot_file = dir.path().join("run.svg");
    render_and_check(&plot_file);

    let content = std::fs::read_to_string(&plot_file).unwrap();
    assert!(content.contains("<svg"));
    assert!(dir.path().join("run.svg.npz").exists());
}

#[test]
fn test_plot_trajectory_empty_data_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let plot_file = dir.path().join("empty.png");
    assert!(plot_trajectory(&TrajectoryData::new(), &TriggerMarkers::new(), &plot_file, &[]).is_err());
    assert!(!archive_path(&plot_file).exists());
}
