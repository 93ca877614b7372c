use super::*;
use crate::config::CameraConfig;
use crate::frame_buffer::FrameBuffer;
use std::sync::Arc;
use std::time::Duration;

fn create_test_camera_config() -> CameraConfig {
    CameraConfig {
        fps: 100,
        resolution: (320, 240),
    }
}

#[tokio::test]
async fn test_synthetic_camera_publishes_frames() {
    let camera = SyntheticCameraBuilder::new()
        .config(create_test_camera_config())
        .build()
        .unwrap();
    let frame_buffer = Arc::new(FrameBuffer::new());

    let guard = camera.start(Arc::clone(&frame_buffer)).await.unwrap();
    assert!(guard.is_running());

    tokio::time::sleep(Duration::from_millis(100)).await;
    guard.stop().await;

    let frame = frame_buffer.latest().expect("no frame published");
    assert_eq!((frame.width, frame.height), (320, 240));
    assert!(camera.frames_produced() > 1);
    assert_eq!(frame_buffer.stats().frames_published, camera.frames_produced());
}

#[tokio::test]
async fn test_dropping_guard_stops_capture() {
    let camera = SyntheticCamera::new(create_test_camera_config());
    let frame_buffer = Arc::new(FrameBuffer::new());

    {
        let _guard = camera.start(Arc::clone(&frame_buffer)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_drop = camera.frames_produced();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(camera.frames_produced(), after_drop);
}

#[test]
fn test_camera_builder_validation() {
    assert!(SyntheticCameraBuilder::new().build().is_err());

    let result = SyntheticCameraBuilder::new()
        .config(CameraConfig {
            fps: 0,
            resolution: (640, 480),
        })
        .build();
    assert!(result.is_err());
}
