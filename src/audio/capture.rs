//! Spectrum capture: turns the most recently played samples into packed
//! FFT frames and delivers them on a timer from a dedicated thread.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::SourceError;

/// Highest rate at which the capture thread delivers frames.
pub const MAX_CAPTURE_RATE_HZ: u32 = 20;

/// Smallest and largest supported capture sizes.
pub const MIN_CAPTURE_SIZE: usize = 128;
pub const MAX_CAPTURE_SIZE: usize = 1024;

/// Whether `size` is a capture size the facility can produce.
pub fn is_valid_capture_size(size: usize) -> bool {
    size.is_power_of_two() && (MIN_CAPTURE_SIZE..=MAX_CAPTURE_SIZE).contains(&size)
}

/// Callback receiving each captured frame.
pub type FrameCallback = Box<dyn FnMut(&[i8]) + Send + 'static>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded history of the most recently played mono samples.
///
/// Written by the audio callback, read by the capture thread.
#[derive(Debug, Clone)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push_slice(&self, data: &[f32]) {
        let mut samples = lock(&self.samples);
        samples.extend(data.iter().copied());
        let excess = samples.len().saturating_sub(self.capacity);
        samples.drain(..excess);
    }

    /// The last `count` samples, zero-padded at the front if fewer exist.
    pub fn latest(&self, count: usize) -> Vec<f32> {
        let samples = lock(&self.samples);
        let available = samples.len().min(count);
        let mut out = vec![0.0; count - available];
        out.extend(samples.iter().skip(samples.len() - available).copied());
        out
    }

    pub fn clear(&self) {
        lock(&self.samples).clear();
    }
}

/// Converts windows of samples into packed spectrum frames.
///
/// Frame layout for capture size N: `[0]` real part of the DC bin, `[1]` real
/// part of the Nyquist bin, then real/imaginary pairs for bins 1..N/2. Values
/// are scaled so a full-scale sinusoid peaks near 127.
pub struct SpectrumCapture {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumCapture {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        // Hann window, normalized so its mean is 1 and amplitudes are kept
        let window = (0..size)
            .map(|i| 1.0 - (std::f32::consts::TAU * i as f32 / size as f32).cos())
            .collect();

        Self {
            size,
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Computes the packed frame for `samples` (length must equal the size).
    pub fn frame(&mut self, samples: &[f32]) -> Vec<i8> {
        debug_assert_eq!(samples.len(), self.size);

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let half = self.size / 2;
        let scale = 128.0 / half as f32;
        let quantize = |v: f32| (v * scale).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8;

        let mut out = vec![0i8; self.size];
        out[0] = quantize(self.buffer[0].re);
        out[1] = quantize(self.buffer[half].re);
        for k in 1..half {
            out[2 * k] = quantize(self.buffer[k].re);
            out[2 * k + 1] = quantize(self.buffer[k].im);
        }
        out
    }
}

/// Delivery gate. The capture thread runs the callback while holding it, so
/// disabling it waits for any in-flight delivery to finish.
struct Delivery {
    enabled: bool,
    callback: FrameCallback,
}

/// The timer-driven capture thread and its delivery switch.
pub struct CaptureFacility {
    delivery: Arc<Mutex<Delivery>>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<FrameCallback>>,
}

impl CaptureFacility {
    /// Spawns the capture thread, initially disabled.
    ///
    /// The callback is handed back by [`CaptureFacility::release`] so it can
    /// be bound again after a later restart.
    pub fn spawn(
        tap: SampleTap,
        size: usize,
        rate_hz: u32,
        callback: FrameCallback,
    ) -> Result<Self, (SourceError, FrameCallback)> {
        let rate_hz = rate_hz.clamp(1, MAX_CAPTURE_RATE_HZ);
        let period = Duration::from_secs(1) / rate_hz;

        let delivery = Arc::new(Mutex::new(Delivery {
            enabled: false,
            callback,
        }));
        let (shutdown, shutdown_rx) = mpsc::channel::<()>();

        let worker_delivery = Arc::clone(&delivery);
        let spawned = std::thread::Builder::new()
            .name("spectrum-capture".into())
            .spawn(move || {
                let mut capture = SpectrumCapture::new(size);
                tracing::debug!("Spectrum capture started: {} bins at {}Hz", size, rate_hz);

                loop {
                    match shutdown_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let mut delivery = lock(&worker_delivery);
                    if !delivery.enabled {
                        continue;
                    }
                    let frame = capture.frame(&tap.latest(size));
                    (delivery.callback)(&frame);
                }

                tracing::debug!("Spectrum capture stopped");
                // Hand the callback back to whoever joins us
                let mut delivery = lock(&worker_delivery);
                std::mem::replace(&mut delivery.callback, Box::new(|_: &[i8]| {}))
            });

        match spawned {
            Ok(worker) => Ok(Self {
                delivery,
                shutdown: Some(shutdown),
                worker: Some(worker),
            }),
            Err(e) => {
                let mut delivery = lock(&delivery);
                let callback = std::mem::replace(&mut delivery.callback, Box::new(|_: &[i8]| {}));
                Err((SourceError::Capture(e.to_string()), callback))
            }
        }
    }

    /// Enables or disables delivery. Disabling returns only once no callback
    /// is running.
    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.delivery).enabled = enabled;
    }

    /// Stops and joins the capture thread, returning the callback.
    pub fn release(mut self) -> Option<FrameCallback> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Option<FrameCallback> {
        self.set_enabled(false);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(callback) => Some(callback),
            Err(_) => {
                tracing::error!("Spectrum capture thread panicked");
                None
            }
        }
    }
}

impl Drop for CaptureFacility {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn sine(size: usize, bin: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (std::f32::consts::TAU * bin as f32 * i as f32 / size as f32).cos())
            .collect()
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_capture_sizes() {
        assert!(is_valid_capture_size(128));
        assert!(is_valid_capture_size(1024));
        assert!(!is_valid_capture_size(64));
        assert!(!is_valid_capture_size(200));
        assert!(!is_valid_capture_size(2048));
    }

    #[test]
    fn test_silence_packs_to_zeros() {
        let mut capture = SpectrumCapture::new(128);
        assert_eq!(capture.frame(&[0.0; 128]), vec![0i8; 128]);
    }

    #[test]
    fn test_tone_lands_in_its_bin() {
        let mut capture = SpectrumCapture::new(128);
        let frame = capture.frame(&sine(128, 8, 0.5));

        // cosine -> energy in the real part of bin 8
        let peak = frame[16];
        assert!(peak.unsigned_abs() >= 60, "bin 8 real part was {peak}");
        let quiet = frame[40].unsigned_abs();
        assert!(quiet <= 2, "bin 20 real part was {quiet}");
    }

    #[test]
    fn test_full_scale_does_not_wrap() {
        let mut capture = SpectrumCapture::new(128);
        let frame = capture.frame(&sine(128, 0, 1.0));
        assert_eq!(frame[0], i8::MAX);
    }

    #[test]
    fn test_tap_keeps_latest_samples() {
        let tap = SampleTap::new(4);
        tap.push_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(tap.latest(5), vec![0.0, 0.0, 1.0, 2.0, 3.0]);

        tap.push_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(tap.latest(4), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(tap.latest(2), vec![5.0, 6.0]);
    }

    #[test]
    fn test_facility_delivers_only_when_enabled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let facility = CaptureFacility::spawn(
            SampleTap::new(128),
            128,
            MAX_CAPTURE_RATE_HZ,
            Box::new(move |frame| {
                assert_eq!(frame.len(), 128);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .map_err(|(e, _)| e)
        .unwrap();

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        facility.set_enabled(true);
        assert!(wait_until(Duration::from_secs(2), || count.load(Ordering::SeqCst) >= 2));

        facility.set_enabled(false);
        let after_pause = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(count.load(Ordering::SeqCst), after_pause);

        assert!(facility.release().is_some());
    }
}
