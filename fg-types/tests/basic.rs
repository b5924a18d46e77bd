use fg_types::{DilationConstants, Dimensions, ResourceState};

#[test]
fn dimensions_fits_within_checks_both_axes() {
    let swapchain = Dimensions::new(1920, 1080);
    assert!(Dimensions::new(1920, 1080).fits_within(swapchain));
    assert!(Dimensions::new(1280, 720).fits_within(swapchain));
    assert!(!Dimensions::new(1921, 1080).fits_within(swapchain));
    assert!(!Dimensions::new(1920, 1081).fits_within(swapchain));
}

#[test]
fn resource_state_is_a_bitset() {
    let s = ResourceState::COPY_DEST | ResourceState::COMMON;
    assert!(s.contains(ResourceState::COPY_DEST));
    assert!(s.contains(ResourceState::COMMON));
    assert!(!s.contains(ResourceState::UNORDERED_ACCESS));
}

#[test]
fn dilation_constants_advance_jitter_copies_current_into_previous() {
    let mut c = DilationConstants {
        jitter_offset: [0.25, -0.25],
        ..Default::default()
    };
    c.advance_jitter();
    assert_eq!(c.prev_jitter_offset, [0.25, -0.25]);
}

#[test]
fn dilation_constants_default_preexposure_is_one() {
    assert_eq!(DilationConstants::default().pre_exposure, 1.0);
}
