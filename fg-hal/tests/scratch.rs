use fg_hal::backend::{ResourceAllocCallback, ResourceReleaseCallback};
use fg_hal::resource::RawHandle;
use fg_hal::scratch::{self, UserData};
use fg_hal::DeviceError;

fn alloc(_r: &fg_hal::backend::ResourceRequest, _s: fgt::ResourceState) -> Result<RawHandle, DeviceError> {
    Ok(RawHandle::NULL)
}
fn release(_h: RawHandle) {}

#[test]
fn attach_then_lookup_round_trips() {
    let base = 42usize as *const u8;
    let a: ResourceAllocCallback = alloc;
    let r: ResourceReleaseCallback = release;
    scratch::attach(base, UserData { alloc: Some(a), release: Some(r) });
    assert!(scratch::lookup(base).is_some());
    scratch::detach(base);
    assert!(scratch::lookup(base).is_none());
}

#[test]
fn lookup_on_unknown_base_is_none() {
    let base = 0xDEAD_usize as *const u8;
    assert!(scratch::lookup(base).is_none());
}
