/// Database operations for storing polled sensor channels
use crate::database::connection::execute_with_retry;
use crate::utils::ChannelSample;

const INSERT_SAMPLE: &str =
    "INSERT INTO onewire_data(rom_id, device_type, field, value, units, channel, time)
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

/// Store one poll's channel samples in the onewire_data table
///
/// All samples of a poll are written over a single connection. The retry
/// helper re-runs the whole batch if the connection drops midway.
///
/// # Arguments
/// * `samples` - Values selected from the reading
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// Number of inserted rows, or an error message
pub async fn store_samples(samples: &[ChannelSample], database_url: &str) -> Result<u64, String> {
    if samples.is_empty() {
        return Ok(0);
    }

    // Clone data for move into async closure
    let samples = samples.to_vec();

    execute_with_retry(database_url, move |client| {
        let samples = samples.clone();
        async move {
            let statement = client.prepare(INSERT_SAMPLE).await?;
            let mut inserted = 0;
            for sample in &samples {
                inserted += client
                    .execute(
                        &statement,
                        &[
                            &sample.rom_id,
                            &sample.device_type,
                            &sample.field,
                            &sample.value,
                            &sample.units,
                            &sample.channel,
                            &sample.time,
                        ],
                    )
                    .await?;
            }
            Ok::<u64, tokio_postgres::Error>(inserted)
        }
    })
    .await
}
