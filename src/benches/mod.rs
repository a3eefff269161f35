//! Measurement sources. Both produce [`MeasurementRecord`](crate::schema::MeasurementRecord)s
//! in nanoseconds per call.
