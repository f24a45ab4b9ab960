//! Windows counter source via PDH (Performance Data Helper).
//!
//! Reads the "Network Interface" counter category, the same counters
//! Task Manager's network graph is built on:
//!
//!   \Network Interface(<instance>)\Bytes Received/sec
//!   \Network Interface(<instance>)\Bytes Sent/sec
//!
//! Instances are enumerated once at construction. One query holds every
//! counter; each tick collects the query once and then reads each
//! counter's formatted value independently, so a single broken instance
//! degrades to a zero contribution instead of spoiling the sample.

use std::ptr;

use super::{CounterError, CounterSource, InterfaceReading, SamplerError};

type PdhQueryHandle = isize;
type PdhCounterHandle = isize;

const PDH_FMT_DOUBLE: u32 = 0x0000_0200;
const PDH_MORE_DATA: u32 = 0x8000_07D2;
const PERF_DETAIL_WIZARD: u32 = 400;

#[repr(C)]
#[derive(Copy, Clone)]
#[allow(non_camel_case_types, non_snake_case)]
struct PDH_FMT_COUNTERVALUE_DOUBLE {
    CStatus: u32,
    doubleValue: f64,
}

#[link(name = "pdh")]
unsafe extern "system" {
    fn PdhOpenQueryW(
        szDataSource: *const u16,
        dwUserData: usize,
        phQuery: *mut PdhQueryHandle,
    ) -> u32;

    fn PdhAddEnglishCounterW(
        hQuery: PdhQueryHandle,
        szFullCounterPath: *const u16,
        dwUserData: usize,
        phCounter: *mut PdhCounterHandle,
    ) -> u32;

    fn PdhCollectQueryData(hQuery: PdhQueryHandle) -> u32;

    fn PdhGetFormattedCounterValue(
        hCounter: PdhCounterHandle,
        dwFormat: u32,
        lpdwType: *mut u32,
        pValue: *mut PDH_FMT_COUNTERVALUE_DOUBLE,
    ) -> u32;

    fn PdhEnumObjectItemsW(
        szDataSource: *const u16,
        szMachineName: *const u16,
        szObjectName: *const u16,
        mszCounterList: *mut u16,
        pcchCounterListLength: *mut u32,
        mszInstanceList: *mut u16,
        pcchInstanceListLength: *mut u32,
        dwDetailLevel: u32,
        dwFlags: u32,
    ) -> u32;

    fn PdhCloseQuery(hQuery: PdhQueryHandle) -> u32;
}

struct InstanceCounters {
    instance: String,
    down: PdhCounterHandle,
    up: PdhCounterHandle,
}

/// PDH-backed counter source. The query is closed on drop.
pub struct PdhSource {
    query: PdhQueryHandle,
    counters: Vec<InstanceCounters>,
}

impl PdhSource {
    pub fn new() -> Result<Self, SamplerError> {
        let mut query: PdhQueryHandle = 0;
        let status = unsafe { PdhOpenQueryW(ptr::null(), 0, &mut query) };
        if status != 0 {
            return Err(SamplerError::OpenQuery(status));
        }

        // From here the query is owned by `source`, so early returns
        // close it through Drop.
        let mut source = Self {
            query,
            counters: Vec::new(),
        };

        for instance in enumerate_instances()? {
            source.add_instance(instance)?;
        }

        // Baseline collection: rate counters need two samples, so the
        // first tick reads zero.
        unsafe {
            PdhCollectQueryData(source.query);
        }

        tracing::debug!(interfaces = source.counters.len(), "opened network counters");
        Ok(source)
    }

    fn add_instance(&mut self, instance: String) -> Result<(), SamplerError> {
        let down = self.add_counter(&instance, "Bytes Received/sec")?;
        let up = self.add_counter(&instance, "Bytes Sent/sec")?;
        self.counters.push(InstanceCounters { instance, down, up });
        Ok(())
    }

    fn add_counter(&self, instance: &str, counter: &str) -> Result<PdhCounterHandle, SamplerError> {
        let path = to_wide(&format!("\\Network Interface({instance})\\{counter}"));
        let mut handle: PdhCounterHandle = 0;
        let status =
            unsafe { PdhAddEnglishCounterW(self.query, path.as_ptr(), 0, &mut handle) };
        if status != 0 {
            return Err(SamplerError::OpenCounter {
                instance: instance.to_string(),
                status,
            });
        }
        Ok(handle)
    }
}

impl CounterSource for PdhSource {
    fn read(&mut self) -> Vec<InterfaceReading> {
        let status = unsafe { PdhCollectQueryData(self.query) };
        if status != 0 {
            // Whole-query collection failed; report it per counter so the
            // summation's error-as-zero policy applies uniformly.
            return self
                .counters
                .iter()
                .map(|c| InterfaceReading {
                    instance: c.instance.clone(),
                    down: Err(CounterError::Read {
                        instance: c.instance.clone(),
                        status,
                    }),
                    up: Err(CounterError::Read {
                        instance: c.instance.clone(),
                        status,
                    }),
                })
                .collect();
        }

        self.counters
            .iter()
            .map(|c| InterfaceReading {
                instance: c.instance.clone(),
                down: read_counter(c.down, &c.instance),
                up: read_counter(c.up, &c.instance),
            })
            .collect()
    }
}

impl Drop for PdhSource {
    fn drop(&mut self) {
        if self.query != 0 {
            unsafe {
                PdhCloseQuery(self.query);
            }
        }
    }
}

fn read_counter(handle: PdhCounterHandle, instance: &str) -> Result<f64, CounterError> {
    let mut value = PDH_FMT_COUNTERVALUE_DOUBLE {
        CStatus: 0,
        doubleValue: 0.0,
    };
    let status = unsafe {
        PdhGetFormattedCounterValue(handle, PDH_FMT_DOUBLE, ptr::null_mut(), &mut value)
    };
    if status != 0 {
        return Err(CounterError::Read {
            instance: instance.to_string(),
            status,
        });
    }
    if value.CStatus != 0 {
        return Err(CounterError::NotReady {
            instance: instance.to_string(),
        });
    }
    Ok(value.doubleValue)
}

/// List the instance names of the "Network Interface" counter category.
fn enumerate_instances() -> Result<Vec<String>, SamplerError> {
    let object = to_wide("Network Interface");
    let mut counter_len: u32 = 0;
    let mut instance_len: u32 = 0;

    // Two-call pattern: first call sizes the buffers.
    let status = unsafe {
        PdhEnumObjectItemsW(
            ptr::null(),
            ptr::null(),
            object.as_ptr(),
            ptr::null_mut(),
            &mut counter_len,
            ptr::null_mut(),
            &mut instance_len,
            PERF_DETAIL_WIZARD,
            0,
        )
    };
    if status != PDH_MORE_DATA && status != 0 {
        return Err(SamplerError::EnumerateInstances(status));
    }
    if instance_len == 0 {
        return Ok(Vec::new());
    }

    let mut counters = vec![0u16; counter_len as usize];
    let mut instances = vec![0u16; instance_len as usize];
    let status = unsafe {
        PdhEnumObjectItemsW(
            ptr::null(),
            ptr::null(),
            object.as_ptr(),
            counters.as_mut_ptr(),
            &mut counter_len,
            instances.as_mut_ptr(),
            &mut instance_len,
            PERF_DETAIL_WIZARD,
            0,
        )
    };
    if status != 0 {
        return Err(SamplerError::EnumerateInstances(status));
    }

    Ok(split_multi_sz(&instances))
}

/// Split a PDH multi-string (null-separated, double-null terminated).
fn split_multi_sz(buf: &[u16]) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, &c) in buf.iter().enumerate() {
        if c == 0 {
            if i == start {
                break;
            }
            out.push(String::from_utf16_lossy(&buf[start..i]));
            start = i + 1;
        }
    }
    out
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
