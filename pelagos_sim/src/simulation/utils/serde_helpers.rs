// pelagos_sim/src/simulation/utils/serde_helpers.rs

//! Serde adapters for the nalgebra-typed fields of the scenario config.
//! Scenario files stay plain TOML arrays; the conversion to math types
//! happens here.

/// `Vector3<f64>` as a `[x, y, z]` array.
pub mod vec3_from_array {
    use nalgebra::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vector3<f64>, D::Error> {
        let [x, y, z] = <[f64; 3]>::deserialize(deserializer)?;
        Ok(Vector3::new(x, y, z))
    }
}

/// `UnitQuaternion<f64>` as `[roll, pitch, yaw]` Euler angles in degrees.
pub mod quat_from_euler_deg {
    use nalgebra::UnitQuaternion;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        q: &UnitQuaternion<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let (roll, pitch, yaw) = q.euler_angles();
        [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<UnitQuaternion<f64>, D::Error> {
        let [roll, pitch, yaw] = <[f64; 3]>::deserialize(deserializer)?;
        Ok(UnitQuaternion::from_euler_angles(
            roll.to_radians(),
            pitch.to_radians(),
            yaw.to_radians(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::{UnitQuaternion, Vector3};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(with = "super::vec3_from_array")]
        position: Vector3<f64>,
        #[serde(with = "super::quat_from_euler_deg")]
        attitude: UnitQuaternion<f64>,
    }

    #[test]
    fn test_toml_arrays_become_math_types() {
        let parsed: Wrapper =
            toml::from_str("position = [1.0, 2.0, -3.0]\nattitude = [0.0, 0.0, 90.0]").unwrap();
        assert_abs_diff_eq!(parsed.position, Vector3::new(1.0, 2.0, -3.0), epsilon = 1e-12);
        let expected = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(parsed.attitude.angle_to(&expected), 0.0, epsilon = 1e-12);
    }
}
