//! DMP Output Frames
//!
//! With the MotionApps firmware loaded, the DMP pushes one frame per sample
//! into the FIFO. With every channel enabled a frame is 48 bytes:
//!
//! ```text
//! offset  field                    encoding
//!  0..16  quaternion W, X, Y, Z    i32 BE, Q30
//! 16..28  gyro X, Y, Z             i32 BE, raw reading in the high 16 bits
//! 28..34  mag X, Y, Z              i16 BE
//! 34..46  accel X, Y, Z            i32 BE, raw reading in the high 16 bits
//! 46..48  trailer                  ignored
//! ```
//!
//! A [`PacketLayout`] describes which channels the firmware emits; disabled
//! channels are left out and the following ones move up. A [`Packet`] is a
//! length-checked view over the bytes of one frame, and every accessor is a
//! pure function of those bytes. [`PacketCodec`] adds the one piece of state
//! kept between frames, the linear acceleration filter.

use core::fmt::{Display, Formatter};

use crate::{
    accel::{Accel, AccelFullScale},
    euler::Euler,
    gravity::Gravity,
    gyro::Gyro,
    linear_accel::{LinearAccel, LinearAccelFilter},
    magnetometer::Mag,
    quaternion::Quaternion,
    yaw_pitch_roll::YawPitchRoll,
};

pub use crate::quaternion::QUATERNION_EPSILON;

/// Bytes at the end of every frame that carry no sensor data.
pub const TRAILER_LEN: usize = 2;

/// Size of a frame with every channel enabled.
pub const MAX_PACKET_SIZE: usize = PacketLayout::CANONICAL.len();

/// A group of values in a DMP frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    Quaternion,
    Gyro,
    Mag,
    Accel,
}

impl Channel {
    /// Bytes the channel occupies in a frame.
    pub const fn size(self) -> usize {
        match self {
            Self::Quaternion => 16,
            Self::Gyro => 12,
            Self::Mag => 6,
            Self::Accel => 12,
        }
    }
}

/// Which channels the loaded firmware writes into each frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channels {
    pub quaternion: bool,
    pub gyro: bool,
    pub mag: bool,
    pub accel: bool,
}

impl Channels {
    pub const ALL: Self = Self {
        quaternion: true,
        gyro: true,
        mag: true,
        accel: true,
    };

    pub const fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Quaternion => self.quaternion,
            Channel::Gyro => self.gyro,
            Channel::Mag => self.mag,
            Channel::Accel => self.accel,
        }
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::ALL
    }
}

/// Byte layout of a DMP frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketLayout {
    channels: Channels,
}

/// Channels in the order they appear in a frame.
const ORDER: [Channel; 4] = [Channel::Quaternion, Channel::Gyro, Channel::Mag, Channel::Accel];

impl PacketLayout {
    /// The 48-byte MotionApps frame.
    pub const CANONICAL: Self = Self::new(Channels::ALL);

    pub const fn new(channels: Channels) -> Self {
        Self { channels }
    }

    pub const fn channels(&self) -> Channels {
        self.channels
    }

    /// Bytes from the start of the frame to `channel`, `None` when it is disabled.
    pub const fn offset(&self, channel: Channel) -> Option<usize> {
        if !self.channels.contains(channel) {
            return None;
        }
        let mut offset = 0;
        let mut i = 0;
        while i < ORDER.len() {
            let c = ORDER[i];
            if c as u8 == channel as u8 {
                break;
            }
            if self.channels.contains(c) {
                offset += c.size();
            }
            i += 1;
        }
        Some(offset)
    }

    /// Frame size in bytes, trailer included.
    pub const fn len(&self) -> usize {
        let mut len = TRAILER_LEN;
        let mut i = 0;
        while i < ORDER.len() {
            if self.channels.contains(ORDER[i]) {
                len += ORDER[i].size();
            }
            i += 1;
        }
        len
    }
}

impl Default for PacketLayout {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Why a frame could not be decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DecodeError {
    /// The byte count does not match the layout
    FrameLength { expected: usize, actual: usize },
    /// The layout does not include the requested channel
    ChannelNotPresent(Channel),
    /// The quaternion is (close to) zero and cannot be normalized
    Degenerate,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FrameLength { expected, actual } => {
                write!(f, "frame of {} bytes, expected {}", actual, expected)
            }
            Self::ChannelNotPresent(channel) => write!(f, "{:?} is not part of the frame", channel),
            Self::Degenerate => f.write_str("degenerate quaternion"),
        }
    }
}

fn be_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// High 16 bits of a 32-bit fixed-point value.
const fn high_half(value: i32) -> i16 {
    (value >> 16) as i16
}

/// One DMP frame.
#[derive(Copy, Clone, Debug)]
pub struct Packet<'a> {
    bytes: &'a [u8],
    layout: PacketLayout,
}

impl<'a> Packet<'a> {
    /// Wraps `bytes`, which must be exactly `layout.len()` long.
    pub fn new(bytes: &'a [u8], layout: &PacketLayout) -> Result<Self, DecodeError> {
        if bytes.len() != layout.len() {
            return Err(DecodeError::FrameLength {
                expected: layout.len(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            layout: *layout,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn layout(&self) -> &PacketLayout {
        &self.layout
    }

    fn channel(&self, channel: Channel) -> Result<&'a [u8], DecodeError> {
        let offset = self
            .layout
            .offset(channel)
            .ok_or(DecodeError::ChannelNotPresent(channel))?;
        Ok(&self.bytes[offset..offset + channel.size()])
    }

    fn words<const N: usize>(&self, channel: Channel) -> Result<[i32; N], DecodeError> {
        let bytes = self.channel(channel)?;
        let mut words = [0; N];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = be_i32(chunk);
        }
        Ok(words)
    }

    /// Quaternion components `[w, x, y, z]` in Q30.
    pub fn quaternion_i32(&self) -> Result<[i32; 4], DecodeError> {
        self.words(Channel::Quaternion)
    }

    /// Quaternion components `[w, x, y, z]` in Q14.
    pub fn quaternion_i16(&self) -> Result<[i16; 4], DecodeError> {
        Ok(self.quaternion_i32()?.map(high_half))
    }

    /// Normalized orientation.
    pub fn quaternion(&self) -> Result<Quaternion, DecodeError> {
        Quaternion::from_q30(self.quaternion_i32()?)
    }

    /// Gyro words as sent by the DMP, before dropping the low half.
    pub fn gyro_i32(&self) -> Result<[i32; 3], DecodeError> {
        self.words(Channel::Gyro)
    }

    pub fn gyro(&self) -> Result<Gyro, DecodeError> {
        let [x, y, z] = self.gyro_i32()?.map(high_half);
        Ok(Gyro::new(x, y, z))
    }

    /// Accelerometer words as sent by the DMP, before dropping the low half.
    pub fn accel_i32(&self) -> Result<[i32; 3], DecodeError> {
        self.words(Channel::Accel)
    }

    pub fn accel(&self) -> Result<Accel, DecodeError> {
        let [x, y, z] = self.accel_i32()?.map(high_half);
        Ok(Accel::new(x, y, z))
    }

    pub fn mag(&self) -> Result<Mag, DecodeError> {
        let mut raw = [0u8; 6];
        raw.copy_from_slice(self.channel(Channel::Mag)?);
        Ok(Mag::from_bytes(raw))
    }

    pub fn gravity(&self) -> Result<Gravity, DecodeError> {
        Ok(Gravity::from(self.quaternion()?))
    }

    pub fn euler(&self) -> Result<Euler, DecodeError> {
        Ok(Euler::from(self.quaternion()?))
    }

    pub fn yaw_pitch_roll(&self) -> Result<YawPitchRoll, DecodeError> {
        let q = self.quaternion()?;
        Ok(YawPitchRoll::new(&q, &Gravity::from(&q)))
    }

    /// Acceleration with gravity removed, unfiltered.
    pub fn linear_accel(&self, scale: AccelFullScale) -> Result<LinearAccel, DecodeError> {
        Ok(LinearAccel::from_accel(
            &self.accel()?,
            &self.gravity()?,
            scale.one_g(),
        ))
    }
}

/// Decodes frames of one sensor stream.
///
/// Holds the frame layout, the accelerometer range the DMP was configured
/// with and the linear acceleration filter. Use one codec per sensor.
#[derive(Clone, Debug)]
pub struct PacketCodec {
    layout: PacketLayout,
    accel_scale: AccelFullScale,
    filter: LinearAccelFilter,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(PacketLayout::CANONICAL, AccelFullScale::G2)
    }
}

impl PacketCodec {
    pub const fn new(layout: PacketLayout, accel_scale: AccelFullScale) -> Self {
        Self {
            layout,
            accel_scale,
            filter: LinearAccelFilter::DISABLED,
        }
    }

    pub fn layout(&self) -> &PacketLayout {
        &self.layout
    }

    pub fn accel_scale(&self) -> AccelFullScale {
        self.accel_scale
    }

    /// Size of the frames this codec expects.
    pub fn packet_size(&self) -> usize {
        self.layout.len()
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Packet<'a>, DecodeError> {
        Packet::new(bytes, &self.layout)
    }

    /// Set the smoothing coefficient of the linear acceleration filter.
    /// See [`LinearAccelFilter::set_coefficient`].
    pub fn set_linear_accel_filter_coefficient(&mut self, coefficient: f32) -> f32 {
        self.filter.set_coefficient(coefficient)
    }

    pub fn linear_accel_filter_coefficient(&self) -> f32 {
        self.filter.coefficient()
    }

    /// Linear acceleration of `packet`, passed through the filter.
    pub fn linear_accel(&mut self, packet: &Packet<'_>) -> Result<LinearAccel, DecodeError> {
        let raw = packet.linear_accel(self.accel_scale)?;
        Ok(self.filter.apply(raw))
    }

    /// Filtered linear acceleration rotated into the world frame.
    pub fn linear_accel_in_world(
        &mut self,
        packet: &Packet<'_>,
    ) -> Result<LinearAccel, DecodeError> {
        let q = packet.quaternion()?;
        Ok(self.linear_accel(packet)?.in_world(&q))
    }

    /// Forget the filter history; the next frame passes through unsmoothed.
    pub fn reset_filter(&mut self) {
        self.filter.reset();
    }
}
