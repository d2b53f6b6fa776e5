use base64::Engine;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

// Define standard sample rates for clarity and consistency
pub const OPENAI_SPEECH_PCM16_SAMPLE_RATE: f64 = 24000.0;
pub const OPENAI_REALTIME_API_PCM16_SAMPLE_RATE: f64 = 24000.0;
pub const TWILIO_MULAW_SAMPLE_RATE: f64 = 8000.0;

/// 20 ms of 8 kHz mu-law audio, the frame size Twilio itself sends.
pub const TWILIO_FRAME_BYTES: usize = 160;

const RESAMPLE_CHUNK_SIZE: usize = 1024;
const MULAW_BIAS: i32 = 0x84;
const MULAW_CLIP: i32 = 32635;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,                     // No cutoff frequency, pass all frequencies
        PolynomialDegree::Cubic, // Cubic interpolation for quality
        chunk_size,
        1, // 1 channel (mono)
    )?;
    Ok(resampler)
}

/// Resamples a whole mono clip from `in_rate` to `out_rate`.
pub fn resample(samples: &[f32], in_rate: f64, out_rate: f64) -> anyhow::Result<Vec<f32>> {
    if samples.is_empty() || in_rate == out_rate {
        return Ok(samples.to_vec());
    }

    let mut resampler = create_resampler(in_rate, out_rate, RESAMPLE_CHUNK_SIZE)?;
    let expected_len = (samples.len() as f64 * out_rate / in_rate).ceil() as usize;
    let mut output = Vec::with_capacity(expected_len + RESAMPLE_CHUNK_SIZE);

    let mut position = 0;
    while samples.len() - position >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let input = [&samples[position..position + needed]];
        let processed = resampler.process(&input[..], None)?;
        output.extend_from_slice(&processed[0]);
        position += needed;
    }
    if position < samples.len() {
        let input = [&samples[position..]];
        let processed = resampler.process_partial(Some(&input[..]), None)?;
        output.extend_from_slice(&processed[0]);
    }

    Ok(output)
}

/// A resampler for audio that arrives in arbitrarily sized pieces.
///
/// Input is buffered until the resampler has a full chunk, so no padding is
/// ever inserted between pieces.
pub struct StreamResampler {
    resampler: FastFixedIn<f32>,
    pending: Vec<f32>,
}

impl StreamResampler {
    pub fn new(in_rate: f64, out_rate: f64, chunk_size: usize) -> anyhow::Result<Self> {
        Ok(Self {
            resampler: create_resampler(in_rate, out_rate, chunk_size)?,
            pending: Vec::with_capacity(chunk_size * 2),
        })
    }

    /// Feeds samples in and returns whatever output full chunks produced.
    pub fn push(&mut self, samples: &[f32]) -> anyhow::Result<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        let mut output = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            let processed = self.resampler.process(&[chunk], None)?;
            output.extend_from_slice(&processed[0]);
        }
        Ok(output)
    }
}

/// Interprets little-endian bytes as PCM16 samples. A trailing odd byte is dropped.
pub fn decode_pcm16_le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Converts a slice of i16 samples to a vector of f32 samples.
pub fn convert_i16_to_f32(pcm16: &[i16]) -> Vec<f32> {
    pcm16
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

/// Encodes one linear PCM16 sample as G.711 mu-law.
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut pcm = sample as i32;
    let sign: u8 = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0
    };
    pcm = pcm.min(MULAW_CLIP) + MULAW_BIAS;

    let mut exponent: u8 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && (pcm & mask) == 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = ((pcm >> (exponent + 3)) & 0x0F) as u8;
    !(sign | (exponent << 4) | mantissa)
}

/// Decodes one G.711 mu-law byte to linear PCM16.
pub fn mulaw_to_linear(byte: u8) -> i16 {
    let inverted = !byte;
    let exponent = (inverted >> 4) & 0x07;
    let mantissa = (inverted & 0x0F) as i32;
    let magnitude = (((mantissa << 3) + MULAW_BIAS) << exponent) - MULAW_BIAS;
    if inverted & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Decodes a buffer of mu-law bytes to linear PCM16.
pub fn decode_mulaw(mulaw: &[u8]) -> Vec<i16> {
    mulaw.iter().map(|&byte| mulaw_to_linear(byte)).collect()
}

/// Encodes PCM16 samples as base64 little-endian bytes.
pub fn encode_i16(pcm16: &[i16]) -> String {
    let pcm16_bytes: Vec<u8> = pcm16
        .iter()
        .flat_map(|&sample| sample.to_le_bytes())
        .collect();
    base64::engine::general_purpose::STANDARD.encode(&pcm16_bytes)
}

/// Turns synthesized PCM16 (little-endian bytes at `in_rate`) into 8 kHz mu-law.
pub fn pcm16_to_twilio_mulaw(pcm16_bytes: &[u8], in_rate: f64) -> anyhow::Result<Vec<u8>> {
    let pcm32 = convert_i16_to_f32(&decode_pcm16_le(pcm16_bytes));
    let resampled = resample(&pcm32, in_rate, TWILIO_MULAW_SAMPLE_RATE)?;
    Ok(convert_f32_to_i16(&resampled)
        .into_iter()
        .map(linear_to_mulaw)
        .collect())
}

/// Splits mu-law audio into base64 payloads for Twilio `media` messages.
pub fn encode_mulaw_frames(mulaw: &[u8]) -> Vec<String> {
    mulaw
        .chunks(TWILIO_FRAME_BYTES)
        .map(|frame| base64::engine::general_purpose::STANDARD.encode(frame))
        .collect()
}

/// Decodes a Twilio `media` payload into raw mu-law bytes.
pub fn decode_payload(payload: &str) -> anyhow::Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_create_resampler() {
        assert!(create_resampler(24000.0, 8000.0, 1024).is_ok());
        assert!(create_resampler(8000.0, 8000.0, 1024).is_ok());
        assert!(create_resampler(8000.0, 24000.0, 1024).is_ok());
    }

    #[test]
    fn test_resample_downsamples_to_a_third() {
        let one_second: Vec<f32> = (0..24000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 24000.0).sin() * 0.5)
            .collect();
        let resampled =
            resample(&one_second, OPENAI_SPEECH_PCM16_SAMPLE_RATE, TWILIO_MULAW_SAMPLE_RATE)
                .unwrap();

        // Partial-chunk flushing may pad the tail by up to one chunk.
        assert!(resampled.len() >= 7900, "got {}", resampled.len());
        assert!(resampled.len() <= 8000 + RESAMPLE_CHUNK_SIZE, "got {}", resampled.len());
        assert!(resampled.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_resample_passthrough() {
        let samples = vec![0.1f32, -0.2, 0.3];
        assert_eq!(resample(&samples, 8000.0, 8000.0).unwrap(), samples);
        assert!(resample(&[], 24000.0, 8000.0).unwrap().is_empty());
    }

    #[test]
    fn test_stream_resampler_buffers_small_pieces() {
        let mut resampler =
            StreamResampler::new(TWILIO_MULAW_SAMPLE_RATE, OPENAI_REALTIME_API_PCM16_SAMPLE_RATE, 160)
                .unwrap();

        // Half a chunk produces nothing yet.
        assert!(resampler.push(&[0.0; 80]).unwrap().is_empty());

        let mut total = 0;
        for _ in 0..9 {
            total += resampler.push(&[0.25; 80]).unwrap().len();
        }
        // Five full chunks of 160 at 3x.
        assert!((2300..=2500).contains(&total), "got {}", total);
    }

    #[test]
    fn test_encode_i16() {
        let encoded = encode_i16(&[256, -256, 0]);
        let bytes = decode_payload(&encoded).unwrap();
        assert_eq!(decode_pcm16_le(&bytes), vec![256, -256, 0]);
        assert_eq!(encode_i16(&[]), "");
    }

    #[test]
    fn test_decode_mulaw() {
        assert_eq!(decode_mulaw(&[0xFF, 0x80, 0x00]), vec![0, 32124, -32124]);
    }

    #[test]
    fn test_decode_pcm16_le() {
        assert_eq!(decode_pcm16_le(&[0x00, 0x40, 0x00, 0x80]), vec![16384, -32768]);
        assert_eq!(decode_pcm16_le(&[0x01]), Vec::<i16>::new());
    }

    #[test]
    fn test_convert_f32_to_i16() {
        let result = convert_f32_to_i16(&[1.0, -1.0, 0.0, 2.0, -2.0]);
        assert_eq!(result, vec![i16::MAX, -32767, 0, i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_convert_i16_to_f32() {
        let result = convert_i16_to_f32(&[16384, 0, i16::MIN]);
        assert_abs_diff_eq!(result[0], 0.5, epsilon = 0.0001);
        assert_abs_diff_eq!(result[1], 0.0, epsilon = 0.0001);
        assert_abs_diff_eq!(result[2], -1.0, epsilon = 0.0001);
    }

    #[test]
    fn test_mulaw_reference_points() {
        assert_eq!(linear_to_mulaw(0), 0xFF);
        assert_eq!(linear_to_mulaw(i16::MAX), 0x80);
        assert_eq!(linear_to_mulaw(i16::MIN), 0x00);

        assert_eq!(mulaw_to_linear(0xFF), 0);
        assert_eq!(mulaw_to_linear(0x80), 32124);
        assert_eq!(mulaw_to_linear(0x00), -32124);
    }

    #[test]
    fn test_mulaw_quantization_error_is_bounded() {
        for sample in (-32000i16..=32000).step_by(97) {
            let decoded = mulaw_to_linear(linear_to_mulaw(sample));
            let error = (decoded as i32 - sample as i32).abs();
            // Step size doubles per segment; the top segment quantizes in 256s.
            let allowed = (sample as i32).abs() / 16 + 16;
            assert!(error <= allowed, "{} decoded as {}", sample, decoded);
            assert_eq!(decoded.signum(), sample.signum() * (decoded != 0) as i16);
        }
    }

    #[test]
    fn test_mulaw_is_monotonic() {
        let mut previous = mulaw_to_linear(linear_to_mulaw(i16::MIN));
        for sample in (i16::MIN..=i16::MAX).step_by(64) {
            let decoded = mulaw_to_linear(linear_to_mulaw(sample));
            assert!(decoded >= previous, "{} decoded below its predecessor", sample);
            previous = decoded;
        }
    }

    #[test]
    fn test_pcm16_to_twilio_mulaw_silence() {
        let silence = vec![0u8; 24000 * 2 / 10]; // 100 ms at 24 kHz
        let mulaw = pcm16_to_twilio_mulaw(&silence, OPENAI_SPEECH_PCM16_SAMPLE_RATE).unwrap();
        assert!(mulaw.len() >= 790);
        assert!(mulaw.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_encode_mulaw_frames() {
        let mulaw = vec![0xFFu8; TWILIO_FRAME_BYTES * 2 + 10];
        let frames = encode_mulaw_frames(&mulaw);
        assert_eq!(frames.len(), 3);
        assert_eq!(decode_payload(&frames[0]).unwrap().len(), TWILIO_FRAME_BYTES);
        assert_eq!(decode_payload(&frames[2]).unwrap().len(), 10);
        assert!(encode_mulaw_frames(&[]).is_empty());
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        assert!(decode_payload("invalid_base64!").is_err());
        assert_eq!(decode_payload("").unwrap(), Vec::<u8>::new());
    }
}
