//! Audio file decoding and encoding
//!
//! Decodes WAV, MP3, FLAC, and Ogg/Vorbis input to planar f32 buffers using
//! symphonia, and writes stage results as 16-bit PCM WAV using hound.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use somp_dsp::AudioSignal;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Decode an entire audio file to a planar signal at its source rate.
///
/// The container format is guessed from content with the file extension as
/// a hint. Corrupt packets are skipped; a file that yields no frames at all
/// is an error.
pub fn decode(path: &Path) -> Result<AudioSignal> {
    debug!("Decoding file: {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = &track.codec_params;

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

    let channel_count = codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

    if channel_count == 0 {
        return Err(Error::Decode("Stream reports zero channels".to_string()));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_planar(&decoded, &mut channels),
            Err(e) => {
                warn!("Decode error: {}", e);
                continue;
            }
        }
    }

    if channels.iter().all(|c| c.is_empty()) {
        return Err(Error::Decode(format!(
            "No audio frames decoded from {}",
            path.display()
        )));
    }

    debug!(
        "Decoded {} frames at {} Hz, {} channels",
        channels[0].len(),
        sample_rate,
        channel_count
    );

    Ok(AudioSignal {
        sample_rate,
        channels,
    })
}

/// Append one decoded buffer to the planar output, converting the source
/// sample format to f32.
fn append_planar(decoded: &AudioBufferRef, channels: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::U8(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::U16(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::U24(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::U32(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::S8(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::S16(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::S24(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::S32(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::F32(b) => extend_channels(b.as_ref(), channels),
        AudioBufferRef::F64(b) => extend_channels(b.as_ref(), channels),
    }
}

fn extend_channels<S>(buf: &AudioBuffer<S>, channels: &mut [Vec<f32>])
where
    S: Sample,
    f32: FromSample<S>,
{
    let available = buf.spec().channels.count();
    for (ch, out) in channels.iter_mut().enumerate().take(available) {
        out.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
}

/// Write a signal as a 16-bit PCM WAV file, clipping samples to [-1, 1].
pub fn encode_wav(signal: &AudioSignal, path: &Path) -> Result<()> {
    if signal.channel_count() == 0 || signal.is_empty() {
        return Err(Error::Encode("Refusing to write an empty signal".to_string()));
    }

    let spec = WavSpec {
        channels: signal.channel_count() as u16,
        sample_rate: signal.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| Error::Encode(format!("Failed to create {}: {}", path.display(), e)))?;

    for frame in 0..signal.len() {
        for channel in &signal.channels {
            writer
                .write_sample(float_to_i16(channel[frame]))
                .map_err(|e| Error::Encode(e.to_string()))?;
        }
    }

    writer.finalize().map_err(|e| Error::Encode(e.to_string()))?;

    debug!(
        "Wrote {} frames at {} Hz to {}",
        signal.len(),
        signal.sample_rate,
        path.display()
    );

    Ok(())
}

/// Convert a float sample to 16-bit integer with clipping
#[inline]
fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_signal(frames: usize, amplitude: f32) -> AudioSignal {
        let left: Vec<f32> = (0..frames)
            .map(|i| amplitude * (i as f32 * 0.05).sin())
            .collect();
        let right = left.clone();
        AudioSignal::stereo(left, right, 44100)
    }

    #[test]
    fn test_float_to_i16_clips() {
        assert_eq!(float_to_i16(2.0), 32767);
        assert_eq!(float_to_i16(-2.0), -32767);
        assert_eq!(float_to_i16(0.0), 0);
    }

    #[test]
    fn test_wav_survives_encode_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = sine_signal(4410, 0.5);
        encode_wav(&original, &path).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.len(), original.len());
        for (a, b) in original.channels[0].iter().zip(&decoded.channels[0]) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_decode_missing_file_fails() {
        let err = decode(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"this is not audio data at all").unwrap();
        assert!(decode(&path).is_err());
    }

    #[test]
    fn test_encode_empty_signal_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let signal = AudioSignal::stereo(Vec::new(), Vec::new(), 44100);
        assert!(encode_wav(&signal, &path).is_err());
    }
}
