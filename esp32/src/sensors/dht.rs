//! Bit-banged DHT11 driver on a single GPIO.

#[derive(Debug)]
pub enum DhtError {
    Checksum,
    Timeout,
}

pub struct Dht {
    pin: i32,
}

impl Dht {
    const DATA_BYTES: usize = 5;

    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    /// Busy-waits until the line leaves `level`, returning the time spent in
    /// microseconds, or -1 past `max_wait` microseconds.
    fn wait_level(&self, max_wait: i32, level: i32) -> i32 {
        use esp_idf_svc::sys::*;

        let mut u_sec: i32 = 0;
        unsafe {
            while gpio_get_level(self.pin) == level {
                u_sec += 1;
                if u_sec > max_wait {
                    return -1;
                }
                ets_delay_us(1);
            }
        }

        u_sec
    }

    /// One transaction: `(temperature C, relative humidity %)`.
    pub fn read(&mut self) -> Result<(f32, f32), DhtError> {
        use esp_idf_svc::sys::*;

        let mut data = [0i32; Self::DATA_BYTES];
        let mut byte_inx = 0;
        let mut bit_inx = 7;

        unsafe {
            gpio_set_direction(self.pin, GPIO_MODE_DEF_OUTPUT);

            // pull down for 20 ms to wake the sensor up
            gpio_set_level(self.pin, 0);
            ets_delay_us(20_000);

            // pull up for 25 us to ask for data
            gpio_set_level(self.pin, 1);
            ets_delay_us(25);

            gpio_set_direction(self.pin, GPIO_MODE_DEF_INPUT);
        }

        // The sensor acknowledges with 80 us low, then 80 us high.
        if self.wait_level(85, 0) < 0 || self.wait_level(85, 1) < 0 {
            return Err(DhtError::Timeout);
        }

        for _ in 0..40 {
            // each bit starts with a >50 us low signal
            if self.wait_level(56, 0) < 0 {
                return Err(DhtError::Timeout);
            }

            // the length of the high pulse encodes the bit, >40 us is a 1
            let u_sec = self.wait_level(75, 1);
            if u_sec < 0 {
                return Err(DhtError::Timeout);
            }
            if u_sec > 40 {
                data[byte_inx] |= 1 << bit_inx;
            }

            if bit_inx == 0 {
                bit_inx = 7;
                byte_inx += 1;
            } else {
                bit_inx -= 1;
            }
        }

        if data[4] != ((data[0] + data[1] + data[2] + data[3]) & 0xFF) {
            return Err(DhtError::Checksum);
        }

        // DHT11 reports integral values; the second byte of each pair
        // carries the (usually zero) decimal part.
        let humidity = data[0] as f32 + data[1] as f32 / 10.0;
        let temperature = data[2] as f32 + data[3] as f32 / 10.0;

        Ok((temperature, humidity))
    }
}
