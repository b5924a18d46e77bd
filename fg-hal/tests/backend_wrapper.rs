use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

use fg_hal::backend::{
    Backend, BackendWrapper, HeapKind, InitData, ResourceAllocCallback, ResourceRequest,
    ResourceReleaseCallback, ResourceShape,
};
use fg_hal::resource::{GpuResource, RawHandle};
use fg_hal::scratch::UserData;
use fg_hal::DeviceError;
use fgt::{Format, ResourceState, UsageFlags};

struct NativeCounting {
    scratch: Box<[u8]>,
    native_creates: Cell<u32>,
}

impl Backend for NativeCounting {
    fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError> {
        self.native_creates.set(self.native_creates.get() + 1);
        Ok(GpuResource::new(
            RawHandle(0x1 as *mut _),
            request.initial_state,
            request.format,
            fgt::Dimensions::default(),
            request.usage,
        ))
    }

    fn destroy_resource_native(&self, _resource: &GpuResource) {}

    fn scratch_base(&self) -> *const u8 {
        self.scratch.as_ptr()
    }
}

static HOST_ALLOC_COUNT: AtomicU32 = AtomicU32::new(0);
static HOST_RELEASE_COUNT: AtomicU32 = AtomicU32::new(0);

fn host_alloc(request: &ResourceRequest, state: ResourceState) -> Result<RawHandle, DeviceError> {
    HOST_ALLOC_COUNT.fetch_add(1, Ordering::SeqCst);
    let _ = (request, state);
    Ok(RawHandle(0x2 as *mut _))
}

fn host_release(_handle: RawHandle) {
    HOST_RELEASE_COUNT.fetch_add(1, Ordering::SeqCst);
}

fn buffer_request(heap: HeapKind) -> ResourceRequest {
    ResourceRequest {
        shape: ResourceShape::Buffer { size_bytes: 4096 },
        format: Format::Unknown,
        usage: UsageFlags::UNORDERED_ACCESS,
        heap,
        init_data: InitData::None,
        initial_state: ResourceState::COMMON,
    }
}

#[test]
fn falls_back_to_native_backend_without_host_allocator() {
    let backend = NativeCounting {
        scratch: vec![0u8; 16].into_boxed_slice(),
        native_creates: Cell::new(0),
    };
    let wrapper = BackendWrapper::new(backend, None);
    let (resource, pending) = wrapper.create_resource(&buffer_request(HeapKind::Default)).unwrap();
    assert!(pending.is_none());
    assert_eq!(resource.state, ResourceState::COMMON);
}

#[test]
fn routes_through_host_allocator_when_both_callbacks_present() {
    HOST_ALLOC_COUNT.store(0, Ordering::SeqCst);
    HOST_RELEASE_COUNT.store(0, Ordering::SeqCst);

    let backend = NativeCounting {
        scratch: vec![0u8; 16].into_boxed_slice(),
        native_creates: Cell::new(0),
    };
    let alloc: ResourceAllocCallback = host_alloc;
    let release: ResourceReleaseCallback = host_release;
    let wrapper = BackendWrapper::new(
        backend,
        Some(UserData {
            alloc: Some(alloc),
            release: Some(release),
        }),
    );

    let (resource, _) = wrapper.create_resource(&buffer_request(HeapKind::Default)).unwrap();
    assert_eq!(HOST_ALLOC_COUNT.load(Ordering::SeqCst), 1);

    wrapper.destroy_resource(&resource);
    assert_eq!(HOST_RELEASE_COUNT.load(Ordering::SeqCst), 1);
}

#[test]
fn aliasable_usage_bumps_aliasable_byte_counter() {
    let backend = NativeCounting {
        scratch: vec![0u8; 16].into_boxed_slice(),
        native_creates: Cell::new(0),
    };
    let wrapper = BackendWrapper::new(backend, None);
    let mut request = buffer_request(HeapKind::Default);
    request.usage |= UsageFlags::ALIASABLE;
    wrapper.create_resource(&request).unwrap();
    assert_eq!(wrapper.aliasable_bytes(), 4096);
    assert_eq!(wrapper.total_bytes(), 4096);
}

#[test]
fn buffer_init_data_schedules_an_upload_sibling() {
    let backend = NativeCounting {
        scratch: vec![0u8; 16].into_boxed_slice(),
        native_creates: Cell::new(0),
    };
    let wrapper = BackendWrapper::new(backend, None);
    let mut request = buffer_request(HeapKind::Default);
    request.init_data = InitData::Value(1.0);
    let (_resource, pending) = wrapper.create_resource(&request).unwrap();
    assert!(pending.is_some());
}
