//! Apple Silicon accelerometer source via IOKit HID.
//!
//! Reads the Bosch IMU behind the AppleSPU HID interface. Requires root.

use std::ffi::CString;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::error::MotionError;
use super::sample::{MotionSample, SensorReading};
use super::source::AccelerometerSource;

type CFAllocatorRef = *const c_void;
type CFStringRef = *const c_void;
type CFNumberRef = *const c_void;
type CFTypeRef = *const c_void;
type CFDictionaryRef = *const c_void;
type CFMutableDictionaryRef = *mut c_void;
type CFRunLoopRef = *mut c_void;
type CFIndex = isize;

type IOReturn = i32;
type MachPort = u32;
type IOIterator = u32;
type IOObject = u32;
type IOHIDDeviceRef = *mut c_void;

const KERN_SUCCESS: IOReturn = 0;
const K_IO_MAIN_PORT_DEFAULT: MachPort = 0;
const K_CF_ALLOCATOR_DEFAULT: CFAllocatorRef = std::ptr::null();
const K_CF_STRING_ENCODING_UTF8: u32 = 0x08000100;
const K_CF_NUMBER_SINT32_TYPE: CFIndex = 3;

// HID usage identifying the accelerometer
const PAGE_VENDOR: i32 = 0xFF00;
const USAGE_ACCEL: i32 = 3;

// Report layout: three little-endian Q16 values starting at byte 6
const IMU_REPORT_LEN: usize = 22;
const IMU_DATA_OFF: usize = 6;
const ACCEL_SCALE: f64 = 65536.0;
const NATIVE_RATE_HZ: f64 = 800.0;
const REPORT_BUF_SZ: usize = 4096;
const REPORT_INTERVAL_US: i32 = 1000;

/// How long each run loop slice lasts before the stop flag is rechecked
const RUN_LOOP_SLICE_S: f64 = 0.05;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const i8) -> CFMutableDictionaryRef;
    fn IOServiceGetMatchingServices(
        mainPort: MachPort,
        matching: CFDictionaryRef,
        existing: *mut IOIterator,
    ) -> IOReturn;
    fn IOIteratorNext(iterator: IOIterator) -> IOObject;
    fn IORegistryEntryCreateCFProperty(
        entry: IOObject,
        key: CFStringRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> CFTypeRef;
    fn IORegistryEntrySetCFProperty(entry: IOObject, name: CFStringRef, property: CFTypeRef)
        -> IOReturn;
    fn IOObjectRelease(object: IOObject) -> IOReturn;
    fn IOHIDDeviceCreate(allocator: CFAllocatorRef, service: IOObject) -> IOHIDDeviceRef;
    fn IOHIDDeviceOpen(device: IOHIDDeviceRef, options: u32) -> IOReturn;
    fn IOHIDDeviceClose(device: IOHIDDeviceRef, options: u32) -> IOReturn;
    fn IOHIDDeviceRegisterInputReportCallback(
        device: IOHIDDeviceRef,
        report: *mut u8,
        reportLength: CFIndex,
        callback: unsafe extern "C" fn(
            context: *mut c_void,
            result: IOReturn,
            sender: *mut c_void,
            report_type: u32,
            report_id: u32,
            report: *mut u8,
            report_length: CFIndex,
        ),
        context: *mut c_void,
    );
    fn IOHIDDeviceScheduleWithRunLoop(
        device: IOHIDDeviceRef,
        runLoop: CFRunLoopRef,
        runLoopMode: CFStringRef,
    );
    fn IOHIDDeviceUnscheduleFromRunLoop(
        device: IOHIDDeviceRef,
        runLoop: CFRunLoopRef,
        runLoopMode: CFStringRef,
    );
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFStringCreateWithCString(alloc: CFAllocatorRef, cStr: *const i8, encoding: u32)
        -> CFStringRef;
    fn CFNumberCreate(allocator: CFAllocatorRef, theType: CFIndex, valuePtr: *const c_void)
        -> CFNumberRef;
    fn CFNumberGetValue(number: CFNumberRef, theType: CFIndex, valuePtr: *mut c_void) -> bool;
    fn CFRunLoopGetCurrent() -> CFRunLoopRef;
    fn CFRunLoopRunInMode(mode: CFStringRef, seconds: f64, returnAfterSourceHandled: bool) -> i32;
    fn CFRelease(cf: CFTypeRef);

    static kCFRunLoopDefaultMode: CFStringRef;
}

fn cfstr(s: &str) -> Result<CFStringRef, String> {
    let cstr = CString::new(s).map_err(|e| e.to_string())?;
    let cf = unsafe {
        CFStringCreateWithCString(K_CF_ALLOCATOR_DEFAULT, cstr.as_ptr(), K_CF_STRING_ENCODING_UTF8)
    };
    if cf.is_null() {
        return Err(format!("failed to create CFString for {}", s));
    }
    Ok(cf)
}

fn cfnum32(val: i32) -> CFNumberRef {
    unsafe {
        CFNumberCreate(
            K_CF_ALLOCATOR_DEFAULT,
            K_CF_NUMBER_SINT32_TYPE,
            &val as *const i32 as *const c_void,
        )
    }
}

fn prop_int(service: IOObject, key: &str) -> Option<i32> {
    let cf_key = cfstr(key).ok()?;
    let cf_val = unsafe { IORegistryEntryCreateCFProperty(service, cf_key, K_CF_ALLOCATOR_DEFAULT, 0) };
    unsafe { CFRelease(cf_key) };
    if cf_val.is_null() {
        return None;
    }

    let mut val: i32 = 0;
    let ok = unsafe {
        CFNumberGetValue(cf_val, K_CF_NUMBER_SINT32_TYPE, &mut val as *mut i32 as *mut c_void)
    };
    unsafe { CFRelease(cf_val) };
    ok.then_some(val)
}

/// Iterate IOKit services of `class`, calling `visit` until it returns true.
///
/// Returns the service `visit` accepted (caller releases it).
fn find_service(class: &str, mut visit: impl FnMut(IOObject) -> bool) -> Result<Option<IOObject>, String> {
    let class_name = CString::new(class).map_err(|e| e.to_string())?;
    let matching = unsafe { IOServiceMatching(class_name.as_ptr()) };
    if matching.is_null() {
        return Err(format!("failed to create matching dict for {}", class));
    }

    let mut iterator: IOIterator = 0;
    let kr = unsafe {
        IOServiceGetMatchingServices(K_IO_MAIN_PORT_DEFAULT, matching as CFDictionaryRef, &mut iterator)
    };
    if kr != KERN_SUCCESS {
        return Err(format!("IOServiceGetMatchingServices failed for {}: {}", class, kr));
    }

    let mut found = None;
    loop {
        let svc = unsafe { IOIteratorNext(iterator) };
        if svc == 0 {
            break;
        }
        if visit(svc) {
            found = Some(svc);
            break;
        }
        unsafe { IOObjectRelease(svc) };
    }
    unsafe { IOObjectRelease(iterator) };
    Ok(found)
}

/// Wake the SPU drivers so they start producing HID reports
fn wake_spu_drivers() -> Result<(), String> {
    let props = [
        ("SensorPropertyReportingState", 1),
        ("SensorPropertyPowerState", 1),
        ("ReportInterval", REPORT_INTERVAL_US),
    ];

    find_service("AppleSPUHIDDriver", |svc| {
        for (key, val) in &props {
            let Ok(cf_key) = cfstr(key) else { continue };
            let cf_val = cfnum32(*val);
            unsafe {
                IORegistryEntrySetCFProperty(svc, cf_key, cf_val as CFTypeRef);
                CFRelease(cf_key);
                CFRelease(cf_val as CFTypeRef);
            }
        }
        false
    })?;
    Ok(())
}

fn find_accel_device() -> Result<Option<IOObject>, String> {
    find_service("AppleSPUHIDDevice", |svc| {
        prop_int(svc, "PrimaryUsagePage") == Some(PAGE_VENDOR)
            && prop_int(svc, "PrimaryUsage") == Some(USAGE_ACCEL)
    })
}

struct CallbackContext {
    tx: Sender<SensorReading>,
    decimation: u32,
    counter: u32,
}

unsafe extern "C" fn accel_report_callback(
    context: *mut c_void,
    result: IOReturn,
    _sender: *mut c_void,
    _report_type: u32,
    _report_id: u32,
    report: *mut u8,
    report_length: CFIndex,
) {
    let ctx = &mut *(context as *mut CallbackContext);

    if result != KERN_SUCCESS {
        let _ = ctx.tx.send(SensorReading::Error(format!("HID report error {}", result)));
        return;
    }
    if report_length as usize != IMU_REPORT_LEN {
        return;
    }

    ctx.counter += 1;
    if ctx.counter < ctx.decimation {
        return;
    }
    ctx.counter = 0;

    let data = std::slice::from_raw_parts(report, IMU_REPORT_LEN);
    let axis = |i: usize| {
        let o = IMU_DATA_OFF + i * 4;
        i32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]) as f64 / ACCEL_SCALE
    };

    let sample = MotionSample::new(axis(0), axis(1), axis(2), Instant::now());
    let _ = ctx.tx.send(SensorReading::Sample(sample));
}

/// Open the accelerometer and pump the run loop until `stop_flag` is set.
///
/// `ready` receives the setup result before any reading is delivered.
fn run_device(
    decimation: u32,
    tx: Sender<SensorReading>,
    stop_flag: Arc<AtomicBool>,
    ready: Sender<Result<(), String>>,
) {
    let setup = || -> Result<IOHIDDeviceRef, String> {
        wake_spu_drivers()?;
        let service = find_accel_device()?.ok_or("accelerometer not found")?;
        let device = unsafe { IOHIDDeviceCreate(K_CF_ALLOCATOR_DEFAULT, service) };
        unsafe { IOObjectRelease(service) };
        if device.is_null() {
            return Err("failed to create IOHIDDevice".into());
        }
        let kr = unsafe { IOHIDDeviceOpen(device, 0) };
        if kr != KERN_SUCCESS {
            unsafe { CFRelease(device as CFTypeRef) };
            return Err(format!("failed to open IOHIDDevice (code {}), are you root?", kr));
        }
        Ok(device)
    };

    let device = match setup() {
        Ok(device) => device,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let report_buf = Box::into_raw(Box::new([0u8; REPORT_BUF_SZ]));
    let ctx = Box::into_raw(Box::new(CallbackContext {
        tx,
        decimation,
        counter: 0,
    }));

    let run_loop = unsafe {
        IOHIDDeviceRegisterInputReportCallback(
            device,
            report_buf as *mut u8,
            REPORT_BUF_SZ as CFIndex,
            accel_report_callback,
            ctx as *mut c_void,
        );
        let run_loop = CFRunLoopGetCurrent();
        IOHIDDeviceScheduleWithRunLoop(device, run_loop, kCFRunLoopDefaultMode);
        run_loop
    };
    let _ = ready.send(Ok(()));

    while !stop_flag.load(Ordering::Acquire) {
        unsafe {
            CFRunLoopRunInMode(kCFRunLoopDefaultMode, RUN_LOOP_SLICE_S, false);
        }
    }

    // No callback can fire once the device is unscheduled and closed
    unsafe {
        IOHIDDeviceUnscheduleFromRunLoop(device, run_loop, kCFRunLoopDefaultMode);
        IOHIDDeviceClose(device, 0);
        CFRelease(device as CFTypeRef);
        drop(Box::from_raw(ctx));
        drop(Box::from_raw(report_buf));
    }
}

/// The built-in accelerometer of Apple Silicon laptops
pub struct AppleSpuSource {
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AppleSpuSource {
    pub fn new() -> Self {
        Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl Default for AppleSpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerometerSource for AppleSpuSource {
    fn name(&self) -> &str {
        "apple-spu"
    }

    fn is_available(&self) -> bool {
        match find_accel_device() {
            Ok(Some(service)) => {
                unsafe { IOObjectRelease(service) };
                true
            }
            _ => false,
        }
    }

    fn start(&mut self, interval: Duration, tx: Sender<SensorReading>) -> Result<(), MotionError> {
        let rate_hz = 1.0 / interval.as_secs_f64().max(1e-3);
        let decimation = (NATIVE_RATE_HZ / rate_hz).round().max(1.0) as u32;

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&self.stop_flag);
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("bikebell-spu".into())
            .spawn(move || run_device(decimation, tx, stop_flag, ready_tx))
            .map_err(|e| MotionError::SensorStartFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::debug!("SPU accelerometer open, keeping 1 in {} reports", decimation);
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(MotionError::SensorStartFailed(e))
            }
            Err(_) => {
                let _ = worker.join();
                Err(MotionError::SensorStartFailed("sensor thread exited".into()))
            }
        }
    }

    fn stop(&mut self) -> Result<(), MotionError> {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| MotionError::SensorStopFailed("sensor thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for AppleSpuSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
