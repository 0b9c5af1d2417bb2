// Audio output using cpal
// One output stream fed from a ring buffer, with live master gain

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::error;

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

enum OutputCommand {
    Resume,
    Shutdown,
}

struct OutputParams {
    producer: Arc<Mutex<RingProducer>>,
    volume: Arc<Mutex<f32>>,
    clear_flag: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

/// Handle to the device output. The `cpal::Stream` itself is not `Send`, so
/// it lives on a dedicated thread for its whole lifetime; this struct keeps
/// the shared pieces (ring producer, gain, clear flag) plus a command
/// channel for resume/shutdown.
pub struct AudioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    producer: Arc<Mutex<RingProducer>>,
    volume: Arc<Mutex<f32>>,
    clear_flag: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Writer handed to a feeder thread so it can push samples without holding
/// any lock on the output slot itself.
pub struct OutputWriter {
    producer: Arc<Mutex<RingProducer>>,
}

impl OutputWriter {
    /// Push as much of `samples` as currently fits; returns how many were
    /// taken.
    pub fn push(&self, samples: &[f32]) -> usize {
        let mut producer = self.producer.lock();
        let mut written = 0;
        for &sample in samples {
            if producer.try_push(sample).is_ok() {
                written += 1;
            } else {
                break;
            }
        }
        written
    }

    /// Free space in the ring buffer.
    pub fn vacant(&self) -> usize {
        self.producer.lock().vacant_len()
    }
}

impl AudioOutput {
    /// Create an output on the default device and start the stream.
    pub fn new() -> Result<Self, String> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || run_output_thread(cmd_rx, ready_tx))
            .map_err(|e| format!("Failed to spawn audio thread: {}", e))?;

        let params = ready_rx
            .recv()
            .map_err(|_| "Audio thread exited during setup".to_string())??;

        Ok(Self {
            cmd_tx,
            producer: params.producer,
            volume: params.volume,
            clear_flag: params.clear_flag,
            sample_rate: params.sample_rate,
            channels: params.channels,
            thread: Some(thread),
        })
    }

    /// Nudge a suspended stream back into playback. Best-effort; the stream
    /// thread logs failures.
    pub fn resume(&self) {
        let _ = self.cmd_tx.send(OutputCommand::Resume);
    }

    pub fn writer(&self) -> OutputWriter {
        OutputWriter {
            producer: Arc::clone(&self.producer),
        }
    }

    /// Drop everything queued; the callback drains the buffer and outputs
    /// silence on its next run.
    pub fn clear(&self) {
        self.clear_flag.store(true, Ordering::SeqCst);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Set the master gain (0.0 to 1.0); applied per sample in the output
    /// callback, so sound already in the buffer follows it.
    pub fn set_volume(&self, vol: f32) {
        *self.volume.lock() = vol.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_output_thread(
    cmd_rx: mpsc::Receiver<OutputCommand>,
    ready_tx: mpsc::Sender<Result<OutputParams, String>>,
) {
    let stream = match build_output(&ready_tx) {
        Some(stream) => stream,
        None => return, // error already reported through ready_tx
    };

    // Hold the stream until shutdown; dropping it closes the device.
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            OutputCommand::Resume => {
                if let Err(e) = stream.play() {
                    error!("Failed to resume audio stream: {}", e);
                }
            }
            OutputCommand::Shutdown => break,
        }
    }
}

fn build_output(ready_tx: &mpsc::Sender<Result<OutputParams, String>>) -> Option<Stream> {
    let fail = |msg: String| {
        let _ = ready_tx.send(Err(msg));
        None
    };

    let host = cpal::default_host();

    let device = match host.default_output_device() {
        Some(device) => device,
        None => return fail("No output device available".to_string()),
    };

    let config = match device.default_output_config() {
        Ok(config) => config,
        Err(e) => return fail(format!("Failed to get default output config: {}", e)),
    };

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();

    let rb = HeapRb::<f32>::new(RING_BUFFER_SIZE);
    let (producer, consumer) = rb.split();
    let producer = Arc::new(Mutex::new(producer));
    let consumer = Arc::new(Mutex::new(consumer));

    let volume = Arc::new(Mutex::new(1.0f32));
    let clear_flag = Arc::new(AtomicBool::new(false));

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(
            &device,
            &config.into(),
            consumer,
            Arc::clone(&volume),
            Arc::clone(&clear_flag),
        ),
        cpal::SampleFormat::I16 => build_stream::<i16>(
            &device,
            &config.into(),
            consumer,
            Arc::clone(&volume),
            Arc::clone(&clear_flag),
        ),
        cpal::SampleFormat::U16 => build_stream::<u16>(
            &device,
            &config.into(),
            consumer,
            Arc::clone(&volume),
            Arc::clone(&clear_flag),
        ),
        format => return fail(format!("Unsupported sample format: {:?}", format)),
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => return fail(e),
    };

    if let Err(e) = stream.play() {
        return fail(format!("Failed to start stream: {}", e));
    }

    let _ = ready_tx.send(Ok(OutputParams {
        producer,
        volume,
        clear_flag,
        sample_rate,
        channels,
    }));

    Some(stream)
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &StreamConfig,
    consumer: Arc<Mutex<RingConsumer>>,
    volume: Arc<Mutex<f32>>,
    clear_flag: Arc<AtomicBool>,
) -> Result<Stream, String> {
    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut consumer = consumer.lock();
                let vol = *volume.lock();

                // A pending clear drains whatever the stopped sound left behind.
                if clear_flag.swap(false, Ordering::SeqCst) {
                    while consumer.try_pop().is_some() {}
                }

                for sample in data.iter_mut() {
                    let value = consumer.try_pop().unwrap_or(0.0) * vol;
                    *sample = T::from_sample(value);
                }
            },
            move |err| {
                error!("Audio output error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("Failed to build output stream: {}", e))?;

    Ok(stream)
}
