//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter     | Implements   | Connects to                     |
//! |-------------|--------------|---------------------------------|
//! | `timer`     | TimerService | Dedicated event-loop thread     |
//! | `esp_timer` | TimerService | ESP-IDF esp_timer task (espidf) |
//! | `pwm`       | IndicatorHal | embedded-hal PWM / GPIO output  |
//! | `ledc`      | IndicatorHal | ESP32 LEDC channels (espidf)    |

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub mod esp_timer;
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub mod ledc;
pub mod pwm;
pub mod timer;
